//! Time-bounded execution of external OS utilities.

use super::ProbeError;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `program` with `args` and return its trimmed stdout.
///
/// The child is killed if it has not exited within `timeout`; that and a
/// non-zero exit status are both reported as errors. Stdout is drained while
/// the child runs so a large output cannot fill the pipe and stall it.
pub fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ProbeError> {
    let spawn_error = |source| ProbeError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(spawn_error)?;

    let reader = child.stdout.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut stdout = String::new();
            pipe.read_to_string(&mut stdout).map(|_| stdout)
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                // The reader finishes once the pipe closes; it is not joined
                // in case a grandchild still holds the write end.
                return Err(ProbeError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_error(source));
            }
        }
    };

    let stdout = match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| ProbeError::Parse(format!("{program} stdout reader panicked")))?
            .map_err(spawn_error)?,
        None => String::new(),
    };

    if !status.success() {
        return Err(ProbeError::ExitStatus {
            program: program.to_string(),
            code: status.code(),
        });
    }

    Ok(stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = run_with_timeout(
            "definitely-not-a-real-program-name",
            &[],
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ProbeError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let output = run_with_timeout("echo", &["hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(output, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_larger_than_pipe_buffer() {
        let output = run_with_timeout(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' a"],
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(output.len(), 200_000);
        assert!(output.chars().all(|c| c == 'a'));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_program_times_out() {
        let started = Instant::now();
        let result = run_with_timeout("sleep", &["5"], Duration::from_millis(100));
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
