use log::debug;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that can occur when running an external command
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot run an empty command")]
    EmptyCommand,

    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for `{command}`")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code}:\n{output}")]
    Failed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("`{command}` did not finish within {timeout_secs} seconds and was killed")]
    Timeout {
        command: String,
        timeout_secs: u64,
    },
}

/// Abstraction over launching external commands, so the pipeline can be
/// exercised without spawning real processes.
pub trait CommandRunner {
    /// Run the given argument vector to completion, forwarding each line of
    /// combined stdout/stderr to `on_output` as it arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, exits non-zero or
    /// exceeds `timeout`.
    fn run(
        &self,
        args: &[String],
        timeout: Duration,
        on_output: &mut dyn FnMut(&str),
    ) -> Result<(), ProcessError>;
}

/// Runner backed by real OS processes.
///
/// Commands are launched from an argument vector, never through a shell, so
/// package names and paths need no quoting.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        args: &[String],
        timeout: Duration,
        on_output: &mut dyn FnMut(&str),
    ) -> Result<(), ProcessError> {
        let (program, program_args) = args.split_first().ok_or(ProcessError::EmptyCommand)?;
        let command_line = args.join(" ");
        debug!("Running `{command_line}`");

        let mut child = Command::new(program)
            .args(program_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::channel::<String>();
        let stderr_tx = tx.clone();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx));
        } else {
            drop(tx);
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, stderr_tx));
        } else {
            drop(stderr_tx);
        }

        let deadline = Instant::now() + timeout;
        let mut output = String::new();
        let mut draining = true;
        let status = loop {
            if draining {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(line) => {
                        on_output(&line);
                        output.push_str(&line);
                        output.push('\n');
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => draining = false,
                }
            } else {
                thread::sleep(POLL_INTERVAL);
            }

            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    return Err(ProcessError::Wait {
                        command: command_line,
                        source,
                    });
                }
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Timeout {
                    command: command_line,
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        // The pipes hit EOF once the child exits; pick up whatever the
        // reader threads buffered after the last poll.
        for reader in readers {
            let _ = reader.join();
        }
        drain_remaining(&rx, on_output, &mut output);

        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::Failed {
                command: command_line,
                code: status.code().unwrap_or(-1),
                output,
            })
        }
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(
    reader: R,
    tx: Sender<String>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

fn drain_remaining(rx: &Receiver<String>, on_output: &mut dyn FnMut(&str), output: &mut String) {
    while let Ok(line) = rx.try_recv() {
        on_output(&line);
        output.push_str(&line);
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn shell(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_run_empty_command_fails() {
        let err = SystemRunner
            .run(&[], Duration::from_secs(1), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, ProcessError::EmptyCommand));
    }

    #[test]
    fn test_run_unknown_program_fails_to_spawn() {
        let args = vec!["definitely-not-a-real-program".to_string()];
        let err = SystemRunner
            .run(&args, Duration::from_secs(1), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_streams_combined_output() {
        let mut lines = Vec::new();
        SystemRunner
            .run(
                &shell("echo out; echo err >&2"),
                Duration::from_secs(10),
                &mut |line| lines.push(line.to_string()),
            )
            .unwrap();

        assert!(lines.contains(&"out".to_string()), "got: {lines:?}");
        assert!(lines.contains(&"err".to_string()), "got: {lines:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_nonzero_exit_carries_output() {
        let err = SystemRunner
            .run(
                &shell("echo boom >&2; exit 3"),
                Duration::from_secs(10),
                &mut |_| {},
            )
            .unwrap_err();

        match err {
            ProcessError::Failed { code, output, .. } => {
                assert_eq!(code, 3);
                assert!(output.contains("boom"), "got: {output}");
            }
            other => panic!("expected Failed, got: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_kills_process_on_timeout() {
        let started = Instant::now();
        let err = SystemRunner
            .run(&shell("sleep 10"), Duration::from_secs(1), &mut |_| {})
            .unwrap_err();

        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(8));
    }
}
