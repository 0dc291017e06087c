//! UCI engine client, one subprocess per analyzed game
//!
//! Only the subset needed for WDL evaluation is spoken: the `uci`/`isready`
//! handshake, `position fen` + `go depth`, and `quit`. Every request is
//! answered by a known token, so a blocking read loop per request is enough.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::BenchError;
use crate::wdl::Wdl;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);
const SHUTDOWN_POLL: Duration = Duration::from_millis(2);

/// Anything that can turn a FEN into a White-relative WDL.
pub trait Evaluator {
    fn evaluate(&mut self, fen: &str) -> Result<Wdl, BenchError>;
}

/// Creates a fresh, private engine for each game.
pub trait EngineLauncher: Sync {
    type Engine: Evaluator;

    fn launch(&self) -> Result<Self::Engine, BenchError>;
}

/// Protocol state over an engine's input and output streams.
pub struct UciSession<W, R> {
    input: W,
    output: R,
    depth: u32,
    line: String,
}

impl<W: Write, R: BufRead> UciSession<W, R> {
    /// Performs the handshake and returns once the engine answered `readyok`.
    pub fn start(input: W, output: R, threads: usize, depth: u32) -> Result<Self, BenchError> {
        let mut session = Self {
            input,
            output,
            depth,
            line: String::with_capacity(512),
        };

        session.send("uci")?;
        session.wait_for("uciok")?;
        session.send(&format!("setoption name Threads value {threads}"))?;
        session.send("setoption name UCI_ShowWDL value true")?;
        session.send("isready")?;
        session.wait_for("readyok")?;
        Ok(session)
    }

    /// Searches `fen` to the configured depth. The last WDL reported before
    /// `bestmove` wins; without any, the result is [`Wdl::UNKNOWN`].
    pub fn evaluate(&mut self, fen: &str) -> Result<Wdl, BenchError> {
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go depth {}", self.depth))?;

        let mut wdl = Wdl::UNKNOWN;
        loop {
            let line = self.next_line("bestmove")?;
            if line.starts_with("bestmove") {
                return Ok(wdl);
            }
            wdl.update_from_info(line);
        }
    }

    /// Asks the engine to exit. Never fails.
    pub fn quit(&mut self) {
        let _ = self.send("quit");
    }

    fn send(&mut self, cmd: &str) -> io::Result<()> {
        trace!(cmd, "engine <");
        writeln!(self.input, "{cmd}")?;
        self.input.flush()
    }

    fn wait_for(&mut self, token: &'static str) -> Result<(), BenchError> {
        loop {
            if self.next_line(token)?.contains(token) {
                return Ok(());
            }
        }
    }

    fn next_line(&mut self, waiting_for: &'static str) -> Result<&str, BenchError> {
        self.line.clear();
        if self.output.read_line(&mut self.line)? == 0 {
            return Err(BenchError::EngineClosed { waiting_for });
        }
        let line = self.line.trim_end();
        trace!(line, "engine >");
        Ok(line)
    }
}

impl<W: Write, R: BufRead> Evaluator for UciSession<W, R> {
    fn evaluate(&mut self, fen: &str) -> Result<Wdl, BenchError> {
        UciSession::evaluate(self, fen)
    }
}

/// A running engine subprocess. Dropping it shuts the process down.
pub struct StockfishEngine {
    child: Child,
    session: UciSession<ChildStdin, BufReader<ChildStdout>>,
    closed: bool,
}

impl StockfishEngine {
    pub fn spawn(path: &str, threads: usize, depth: u32) -> Result<Self, BenchError> {
        Self::from_command(Command::new(path), threads, depth)
    }

    /// Like [`StockfishEngine::spawn`], for an engine that needs arguments.
    pub fn from_command(mut command: Command, threads: usize, depth: u32) -> Result<Self, BenchError> {
        let path = command.get_program().to_string_lossy().into_owned();
        let startup = |reason: String| BenchError::EngineStartup {
            path: path.clone(),
            reason,
        };

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| startup(e.to_string()))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            reap(&mut child);
            return Err(startup("engine pipes unavailable".to_string()));
        };
        // Small buffer keeps per-line latency low.
        let reader = BufReader::with_capacity(256, stdout);

        match UciSession::start(stdin, reader, threads, depth) {
            Ok(session) => Ok(Self {
                child,
                session,
                closed: false,
            }),
            Err(e) => {
                reap(&mut child);
                Err(startup(e.to_string()))
            }
        }
    }

    /// Sends `quit`, then kills the process if it has not exited shortly
    /// after. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.session.quit();

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => thread::sleep(SHUTDOWN_POLL),
                _ => break,
            }
        }
        debug!(pid = self.child.id(), "engine ignored quit, killing");
        reap(&mut self.child);
    }
}

impl Evaluator for StockfishEngine {
    fn evaluate(&mut self, fen: &str) -> Result<Wdl, BenchError> {
        self.session.evaluate(fen)
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Spawns [`StockfishEngine`]s with a fixed path, thread count and depth.
#[derive(Debug, Clone)]
pub struct StockfishLauncher {
    pub path: String,
    pub threads: usize,
    pub depth: u32,
}

impl EngineLauncher for StockfishLauncher {
    type Engine = StockfishEngine;

    fn launch(&self) -> Result<StockfishEngine, BenchError> {
        StockfishEngine::spawn(&self.path, self.threads, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const HANDSHAKE: &str = "id name Fake\nuciok\nreadyok\n";

    fn session(script: &str) -> UciSession<Vec<u8>, Cursor<Vec<u8>>> {
        UciSession::start(Vec::new(), Cursor::new(script.as_bytes().to_vec()), 2, 7)
            .expect("handshake")
    }

    fn written(session: &UciSession<Vec<u8>, Cursor<Vec<u8>>>) -> Vec<&str> {
        std::str::from_utf8(&session.input).unwrap().lines().collect()
    }

    #[test]
    fn test_handshake_commands() {
        let s = session(HANDSHAKE);
        assert_eq!(
            written(&s),
            vec![
                "uci",
                "setoption name Threads value 2",
                "setoption name UCI_ShowWDL value true",
                "isready",
            ]
        );
    }

    #[test]
    fn test_handshake_skips_option_lines() {
        let script = "id name Fake\noption name Threads type spin default 1\nuciok\ninfo string ok\nreadyok\n";
        assert!(UciSession::start(Vec::new(), Cursor::new(script.as_bytes().to_vec()), 1, 1).is_ok());
    }

    #[test]
    fn test_closed_before_uciok() {
        let result = UciSession::start(Vec::new(), Cursor::new(b"id name Fake\n".to_vec()), 1, 1);
        assert!(matches!(
            result,
            Err(BenchError::EngineClosed { waiting_for: "uciok" })
        ));
    }

    #[test]
    fn test_closed_before_readyok() {
        let result = UciSession::start(Vec::new(), Cursor::new(b"uciok\n".to_vec()), 1, 1);
        assert!(matches!(
            result,
            Err(BenchError::EngineClosed { waiting_for: "readyok" })
        ));
    }

    #[test]
    fn test_evaluate_sends_position_and_depth() {
        let mut s = session(&format!("{HANDSHAKE}bestmove e2e4\n"));
        s.evaluate("8/8/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let cmds = written(&s);
        assert_eq!(cmds[cmds.len() - 2], "position fen 8/8/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(cmds[cmds.len() - 1], "go depth 7");
    }

    #[test]
    fn test_evaluate_keeps_last_wdl() {
        let script = format!(
            "{HANDSHAKE}info depth 1 score cp 10 wdl 100 800 100 pv e2e4\n\
             info depth 2 score cp 40 wdl 250 700 50 pv d2d4\n\
             bestmove d2d4 ponder d7d5\n"
        );
        let mut s = session(&script);
        assert_eq!(s.evaluate("startpos").unwrap(), Wdl::new(250, 700, 50));
    }

    #[test]
    fn test_evaluate_without_wdl_is_unknown() {
        let script = format!("{HANDSHAKE}info depth 1 score cp 10 pv e2e4\nbestmove e2e4\n");
        let mut s = session(&script);
        assert_eq!(s.evaluate("startpos").unwrap(), Wdl::new(333, 334, 333));
    }

    #[test]
    fn test_evaluate_does_not_leak_between_requests() {
        let script = format!(
            "{HANDSHAKE}info depth 1 wdl 900 100 0\nbestmove e2e4\n\
             info depth 1 score cp 0\nbestmove e7e5\n"
        );
        let mut s = session(&script);
        assert_eq!(s.evaluate("a").unwrap(), Wdl::new(900, 100, 0));
        assert_eq!(s.evaluate("b").unwrap(), Wdl::UNKNOWN);
    }

    #[test]
    fn test_evaluate_malformed_field_falls_back() {
        let script = format!(
            "{HANDSHAKE}info depth 1 wdl 100 800 100\ninfo depth 2 wdl 150 ??? 50\nbestmove e2e4\n"
        );
        let mut s = session(&script);
        assert_eq!(s.evaluate("startpos").unwrap(), Wdl::new(150, 800, 50));
    }

    #[test]
    fn test_evaluate_closed_midway() {
        let script = format!("{HANDSHAKE}info depth 1 wdl 100 800 100\n");
        let mut s = session(&script);
        assert!(matches!(
            s.evaluate("startpos"),
            Err(BenchError::EngineClosed { waiting_for: "bestmove" })
        ));
    }

    #[test]
    fn test_quit_is_written() {
        let mut s = session(HANDSHAKE);
        s.quit();
        assert_eq!(written(&s).last(), Some(&"quit"));
    }

    #[test]
    fn test_spawn_missing_binary() {
        let result = StockfishEngine::spawn("/nonexistent/engine-binary", 1, 1);
        assert!(matches!(result, Err(BenchError::EngineStartup { .. })));
    }

    #[cfg(unix)]
    fn fake_engine(on_quit: &str) -> StockfishEngine {
        let script = format!(
            r#"while read -r cmd; do
                case "$cmd" in
                    uci) echo "id name Fake"; echo "uciok" ;;
                    isready) echo "readyok" ;;
                    go*) echo "info depth 1 wdl 650 40 310"; echo "info depth 2 wdl 700 2x0 100"; echo "bestmove e2e4" ;;
                    quit) {on_quit} ;;
                esac
            done"#
        );
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        StockfishEngine::from_command(command, 1, 2).expect("fake engine starts")
    }

    #[cfg(unix)]
    #[test]
    fn test_process_evaluate_and_quit() {
        let mut engine = fake_engine("exit 0");
        assert_eq!(engine.evaluate("startpos").unwrap(), Wdl::new(700, 40, 100));

        engine.shutdown();
        let status = engine.child.try_wait().unwrap().expect("engine reaped");
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_ignoring_quit_is_killed() {
        let mut engine = fake_engine(":");
        engine.evaluate("startpos").unwrap();

        let start = Instant::now();
        engine.shutdown();
        let elapsed = start.elapsed();

        let status = engine.child.try_wait().unwrap().expect("engine reaped");
        assert_eq!(status.code(), None);
        assert!(elapsed >= SHUTDOWN_GRACE);
        assert!(elapsed < Duration::from_secs(5));

        // Dropping after an explicit shutdown does nothing more.
        drop(engine);
    }
}
