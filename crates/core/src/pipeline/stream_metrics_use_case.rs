use std::io::{self, BufRead, ErrorKind, Write};
use std::time::Instant;

use thiserror::Error;

use crate::decoding::domain::frame_decoder::{DecodeError, FrameDecoder};
use crate::detection::domain::landmark_provider::{DetectionError, LandmarkProvider};
use crate::metrics::domain::metrics_engine::MetricsEngine;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::protocol::messages::{FrameMessage, MetricsMessage};
use crate::session::session_registry::SessionRegistry;
use crate::shared::clock::Clock;

/// Why a single input line produced no output.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid frame message: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// How the stream loop stopped. None of these is a crash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamEnd {
    /// The input reached end of file.
    #[default]
    EndOfInput,
    /// Reading the input failed.
    InputFailed,
    /// Writing a result line failed, e.g. the reader went away.
    OutputClosed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub lines_read: usize,
    pub frames_emitted: usize,
    pub frames_failed: usize,
    pub sessions: usize,
    pub end: StreamEnd,
}

/// Line-delimited stream loop: parse → decode → detect → metrics → emit.
///
/// Lines are handled strictly in order. A bad line is reported on the
/// diagnostics sink and skipped; it never ends the stream.
pub struct StreamMetricsUseCase {
    decoder: Box<dyn FrameDecoder>,
    provider: Box<dyn LandmarkProvider>,
    engine: MetricsEngine,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
    sessions: SessionRegistry,
}

impl StreamMetricsUseCase {
    pub fn new(
        decoder: Box<dyn FrameDecoder>,
        provider: Box<dyn LandmarkProvider>,
        engine: MetricsEngine,
        clock: Box<dyn Clock>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            decoder,
            provider,
            engine,
            clock,
            logger,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Processes `input` until end of stream, writing one JSON line per
    /// successful frame to `output` and one line per failure to
    /// `diagnostics`.
    ///
    /// An I/O failure on `input` or `output` ends the stream like end of
    /// input does; [`StreamSummary::end`] records which one happened.
    pub fn execute<R, W, D>(
        &mut self,
        mut input: R,
        output: &mut W,
        diagnostics: &mut D,
    ) -> StreamSummary
    where
        R: BufRead,
        W: Write + ?Sized,
        D: Write + ?Sized,
    {
        let mut summary = StreamSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Input failed after {} lines: {e}", summary.lines_read);
                    summary.end = StreamEnd::InputFailed;
                    break;
                }
            }
            summary.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            let message = match self.process_line(line) {
                Ok(message) => message,
                Err(e) => {
                    summary.frames_failed += 1;
                    log::debug!("Line {} failed: {e:?}", summary.lines_read);
                    report(diagnostics, summary.lines_read, &e);
                    continue;
                }
            };

            if let Err(e) = emit(output, &message) {
                if e.kind() == ErrorKind::BrokenPipe {
                    log::warn!("Output closed, stopping after {} frames", summary.frames_emitted);
                } else {
                    log::warn!("Output failed after {} frames: {e}", summary.frames_emitted);
                }
                summary.end = StreamEnd::OutputClosed;
                break;
            }
            summary.frames_emitted += 1;
            self.logger.progress(summary.frames_emitted);
        }

        summary.sessions = self.sessions.len();
        self.logger.info(&format!(
            "Stream ended: {} lines, {} frames emitted, {} failed, {} sessions",
            summary.lines_read, summary.frames_emitted, summary.frames_failed, summary.sessions
        ));
        self.logger.summary();
        summary
    }

    /// Turns one input line into its output message.
    ///
    /// Session state is only created or advanced once decoding and detection
    /// have succeeded, so a failed line leaves every session untouched.
    pub fn process_line(&mut self, line: &str) -> Result<MetricsMessage, FrameError> {
        let message: FrameMessage = serde_json::from_str(line).map_err(FrameError::Parse)?;

        let t0 = Instant::now();
        let frame = self.decoder.decode(&message.frame)?;
        self.logger.timing("decode", elapsed_ms(t0));

        let t0 = Instant::now();
        let faces = self.provider.detect(&frame)?;
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.metric("faces", faces.len() as f64);

        let t0 = Instant::now();
        let now = self.clock.now();
        let state = self.sessions.state_for(&message.interview_id, now);
        let metrics = self.engine.compute(&faces, now, state);
        self.logger.timing("metrics", elapsed_ms(t0));

        Ok(MetricsMessage::new(message.interview_id, metrics))
    }
}

fn emit<W: Write + ?Sized>(output: &mut W, message: &MetricsMessage) -> io::Result<()> {
    serde_json::to_writer(&mut *output, message)?;
    output.write_all(b"\n")?;
    output.flush()
}

/// Best-effort single-line diagnostic; a failing sink is ignored.
fn report<D: Write + ?Sized>(diagnostics: &mut D, line_no: usize, error: &FrameError) {
    let text = error.to_string().replace(['\n', '\r'], " ");
    let _ = writeln!(diagnostics, "line {line_no}: {text}");
    let _ = diagnostics.flush();
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use crate::metrics::domain::heuristics::testing::FaceBuilder;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::clock::testing::ManualClock;
    use crate::shared::frame::Frame;
    use rstest::rstest;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::io::{Cursor, Read};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // --- Stubs ---

    /// Accepts `<header>,<anything non-empty>` and yields a 2x2 black frame.
    struct StubDecoder;

    impl FrameDecoder for StubDecoder {
        fn decode(&self, encoded: &str) -> Result<Frame, DecodeError> {
            let (_, payload) = encoded
                .split_once(',')
                .ok_or(DecodeError::MissingSeparator)?;
            if payload.is_empty() {
                return Err(DecodeError::EmptyPayload);
            }
            Ok(Frame::new(vec![0; 12], 2, 2))
        }
    }

    type Script = Arc<Mutex<VecDeque<Result<Vec<FaceLandmarks>, DetectionError>>>>;

    /// Replays queued detection results in order; no face once exhausted.
    struct ScriptedProvider {
        script: Script,
        calls: Arc<Mutex<usize>>,
    }

    impl LandmarkProvider for ScriptedProvider {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceLandmarks>, DetectionError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct Harness {
        use_case: StreamMetricsUseCase,
        clock: ManualClock,
        script: Script,
        calls: Arc<Mutex<usize>>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = ManualClock::new(Instant::now());
            let script: Script = Arc::new(Mutex::new(VecDeque::new()));
            let calls = Arc::new(Mutex::new(0));
            let provider = ScriptedProvider {
                script: script.clone(),
                calls: calls.clone(),
            };
            let use_case = StreamMetricsUseCase::new(
                Box::new(StubDecoder),
                Box::new(provider),
                MetricsEngine::default(),
                Box::new(clock.clone()),
                Box::new(NullPipelineLogger),
            );
            Self {
                use_case,
                clock,
                script,
                calls,
            }
        }

        fn queue(&self, result: Result<Vec<FaceLandmarks>, DetectionError>) {
            self.script.lock().unwrap().push_back(result);
        }

        fn run(&mut self, input: &str) -> (StreamSummary, Vec<Value>, Vec<String>) {
            let mut out = Vec::new();
            let mut diag = Vec::new();
            let summary = self
                .use_case
                .execute(Cursor::new(input.as_bytes()), &mut out, &mut diag);
            let outputs = String::from_utf8(out)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect();
            let diagnostics = String::from_utf8(diag)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect();
            (summary, outputs, diagnostics)
        }
    }

    fn frame_line(id: &str) -> String {
        format!(r#"{{"interviewId":"{id}","frame":"data:image/jpeg;base64,AAAA"}}"#)
    }

    // --- Tests ---

    #[test]
    fn test_invalid_json_reports_and_continues() {
        let mut h = Harness::new();
        h.queue(Ok(vec![FaceBuilder::new().build()]));
        let input = format!("not json\n{}\n", frame_line("a"));

        let (summary, outputs, diagnostics) = h.run(&input);

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0]["interviewId"], "a");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].starts_with("line 1: invalid frame message"));
        assert_eq!(
            summary,
            StreamSummary {
                lines_read: 2,
                frames_emitted: 1,
                frames_failed: 1,
                sessions: 1,
                end: StreamEnd::EndOfInput,
            }
        );
    }

    #[test]
    fn test_decode_failure_emits_nothing_and_skips_detection() {
        let mut h = Harness::new();
        let input = r#"{"interviewId":"a","frame":"no-separator"}"#;

        let (summary, outputs, diagnostics) = h.run(input);

        assert!(outputs.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("separator"));
        assert_eq!(*h.calls.lock().unwrap(), 0);
        assert_eq!(summary.frames_failed, 1);
    }

    #[test]
    fn test_failed_frame_does_not_touch_session_state() {
        let mut h = Harness::new();
        h.queue(Err(DetectionError::Inference("boom".into())));
        let (_, outputs, diagnostics) = h.run(&frame_line("a"));

        assert!(outputs.is_empty());
        assert_eq!(diagnostics, vec!["line 1: landmark model failed: boom".to_string()]);
        assert!(!h.use_case.sessions().contains("a"));
    }

    #[test]
    fn test_session_clock_starts_at_first_successful_frame() {
        let mut h = Harness::new();
        let start = h.clock.now();
        h.queue(Err(DetectionError::Inference("boom".into())));
        h.run(&frame_line("a"));

        h.clock.advance(Duration::from_secs(3));
        h.run(&frame_line("a"));

        let state = h.use_case.sessions().get("a").unwrap();
        assert_eq!(state.stream_start_time, start + Duration::from_secs(3));
    }

    #[test]
    fn test_blank_line_is_a_diagnostic() {
        let mut h = Harness::new();
        let (summary, outputs, diagnostics) = h.run("\n");
        assert!(outputs.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(summary.lines_read, 1);
    }

    #[test]
    fn test_crlf_and_missing_trailing_newline() {
        let mut h = Harness::new();
        let input = format!("{}\r\n{}", frame_line("a"), frame_line("b"));
        let (summary, outputs, diagnostics) = h.run(&input);
        assert!(diagnostics.is_empty());
        assert_eq!(outputs.len(), 2);
        assert_eq!(summary.sessions, 2);
    }

    #[test]
    fn test_no_face_frame_reports_zeros() {
        let mut h = Harness::new();
        let (_, outputs, _) = h.run(&frame_line("a"));
        assert_eq!(
            outputs[0]["metrics"],
            serde_json::json!({
                "faceCount": 0,
                "eyeContact": 0.0,
                "speaking": 0.0,
                "blinkRate": 0.0
            })
        );
    }

    #[test]
    fn test_end_to_end_blink_debounce_and_eye_contact() {
        let mut h = Harness::new();
        let closed = || FaceBuilder::new().ear(0.1).iris_x(0.5, 0.5).nose_x(0.5).build();

        // t = 0
        h.queue(Ok(vec![closed()]));
        let (_, first, _) = h.run(&frame_line("a"));
        assert_eq!(first[0]["metrics"]["eyeContact"], 1.0);
        assert_eq!(first[0]["metrics"]["faceCount"], 1);

        // t = 0.1s, inside debounce
        h.clock.advance(Duration::from_millis(100));
        h.queue(Ok(vec![closed()]));
        h.run(&frame_line("a"));
        assert_eq!(h.use_case.sessions().get("a").unwrap().blink_counter, 1);

        // t = 0.3s, debounce expired
        h.clock.advance(Duration::from_millis(200));
        h.queue(Ok(vec![closed()]));
        let (_, third, _) = h.run(&frame_line("a"));
        assert_eq!(h.use_case.sessions().get("a").unwrap().blink_counter, 2);

        // 2 blinks in 0.005 minutes
        assert_eq!(third[0]["metrics"]["blinkRate"], 400.0);
    }

    #[test]
    fn test_sessions_do_not_share_blink_state() {
        let mut h = Harness::new();
        h.queue(Ok(vec![FaceBuilder::new().ear(0.1).build()]));
        h.queue(Ok(vec![FaceBuilder::new().ear(0.1).build()]));
        let input = format!("{}\n{}\n", frame_line("a"), frame_line("b"));

        h.run(&input);

        let sessions = h.use_case.sessions();
        assert_eq!(sessions.get("a").unwrap().blink_counter, 1);
        assert_eq!(sessions.get("b").unwrap().blink_counter, 1);
    }

    #[test]
    fn test_process_line_single_unit() {
        let mut h = Harness::new();
        h.queue(Ok(vec![FaceBuilder::new().mouth_opening(0.1).build()]));
        let message = h.use_case.process_line(&frame_line("x")).unwrap();
        assert_eq!(message.interview_id, "x");
        assert_eq!(message.metrics.0.face_count, 1);
        assert_eq!(message.metrics.0.speaking, 1.0);
    }

    #[test]
    fn test_process_line_parse_error_variant() {
        let mut h = Harness::new();
        let err = h.use_case.process_line("{").unwrap_err();
        assert!(matches!(err, FrameError::Parse(_)));
    }

    // --- I/O failures ---

    struct FailingWriter(ErrorKind);

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(self.0, "sink failed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_pipe_ends_stream_gracefully() {
        let mut h = Harness::new();
        let input = format!("{}\n{}\n", frame_line("a"), frame_line("a"));
        let mut out = FailingWriter(ErrorKind::BrokenPipe);
        let mut diag = Vec::new();

        let summary = h
            .use_case
            .execute(Cursor::new(input.as_bytes()), &mut out, &mut diag);

        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.frames_emitted, 0);
        assert_eq!(summary.end, StreamEnd::OutputClosed);
        assert!(diag.is_empty());
    }

    #[rstest]
    #[case::permission_denied(ErrorKind::PermissionDenied)]
    #[case::storage_full(ErrorKind::Other)]
    #[case::reset(ErrorKind::ConnectionReset)]
    fn test_any_output_error_ends_stream_gracefully(#[case] kind: ErrorKind) {
        let mut h = Harness::new();
        let input = format!("{}\n{}\n", frame_line("a"), frame_line("a"));
        let mut out = FailingWriter(kind);
        let mut diag = Vec::new();

        let summary = h
            .use_case
            .execute(Cursor::new(input.into_bytes()), &mut out, &mut diag);

        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.frames_emitted, 0);
        assert_eq!(summary.sessions, 1);
        assert_eq!(summary.end, StreamEnd::OutputClosed);
    }

    /// Yields its lines, then fails every further read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(ErrorKind::ConnectionReset, "source gone"));
            }
            Ok(n)
        }
    }

    impl BufRead for FailingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.data.fill_buf()?.is_empty() {
                return Err(io::Error::new(ErrorKind::ConnectionReset, "source gone"));
            }
            self.data.fill_buf()
        }
        fn consume(&mut self, amt: usize) {
            self.data.consume(amt);
        }
    }

    #[test]
    fn test_input_error_ends_stream_gracefully() {
        let mut h = Harness::new();
        let input = FailingReader {
            data: Cursor::new(format!("{}\n", frame_line("a")).into_bytes()),
        };
        let mut out = Vec::new();
        let mut diag = Vec::new();

        let summary = h.use_case.execute(input, &mut out, &mut diag);

        assert_eq!(summary.lines_read, 1);
        assert_eq!(summary.frames_emitted, 1);
        assert_eq!(summary.end, StreamEnd::InputFailed);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_failing_diagnostics_sink_is_ignored() {
        let mut h = Harness::new();
        let mut out = Vec::new();
        let mut diag = FailingWriter(ErrorKind::BrokenPipe);

        let summary = h
            .use_case
            .execute(Cursor::new(b"oops\n".to_vec()), &mut out, &mut diag);

        assert_eq!(summary.frames_failed, 1);
        assert!(out.is_empty());
    }
}
