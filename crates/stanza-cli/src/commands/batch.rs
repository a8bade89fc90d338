//! Batch command implementation
//!
//! Jobs are submitted in windows of a few per worker before any is awaited,
//! so identical poems close together collapse into a single render and
//! distinct ones run side by side. Finished images are dropped as soon as
//! their window has been written out.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use stanza::{Fingerprint, RenderTicket, Studio};

use super::image_path;
use crate::cli::BatchArgs;
use crate::jsonl::{BatchJob, JobResult};

/// Jobs in flight per render worker
pub const JOBS_PER_WORKER: usize = 4;

/// Counts reported once the batch is done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
}

enum Pending {
    Submitted(String, RenderTicket),
    Rejected(JobResult),
}

pub fn run(args: &BatchArgs, studio: &Studio) -> Result<BatchSummary> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => {
            log::info!("Reading jobs from stdin");
            Box::new(BufReader::new(io::stdin()))
        },
    };

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let stdout = io::stdout();
    let window = studio.service().workers().max(1) * JOBS_PER_WORKER;
    let summary = process(
        studio,
        reader.lines(),
        &args.output_dir,
        window,
        &mut stdout.lock(),
    )?;

    let stats = studio.service().cache().stats();
    log::info!(
        "Batch done: {} jobs, {} ok, {} failed; cache {} hits, {} misses, {} renders, {} entries, {:.0}% hit rate",
        summary.jobs,
        summary.succeeded,
        summary.failed,
        stats.hits,
        stats.misses,
        stats.renders,
        stats.entries,
        stats.hit_rate() * 100.0
    );

    Ok(summary)
}

/// Render jobs and write one result line per job in input order
///
/// At most `window` jobs are in flight; the window is drained in full before
/// more lines are read.
pub fn process(
    studio: &Studio,
    lines: impl Iterator<Item = io::Result<String>>,
    output_dir: &Path,
    window: usize,
    out: &mut impl Write,
) -> Result<BatchSummary> {
    let window = window.max(1);
    let mut sink = ResultSink {
        output_dir,
        written: HashSet::new(),
        summary: BatchSummary::default(),
        out,
    };
    let mut pending = Vec::with_capacity(window);

    for (line_num, line) in lines.enumerate() {
        let line = line.context("Failed to read job line")?;
        if line.trim().is_empty() {
            continue;
        }

        pending.push(submit(studio, &line, line_num + 1));
        if pending.len() >= window {
            log::debug!("Draining {} jobs", pending.len());
            pending.drain(..).try_for_each(|job| sink.finish(job))?;
        }
    }
    pending.into_iter().try_for_each(|job| sink.finish(job))?;

    sink.out.flush().context("Failed to flush results")?;
    Ok(sink.summary)
}

fn submit(studio: &Studio, line: &str, line_num: usize) -> Pending {
    let line_id = line_num.to_string();

    let job: BatchJob = match serde_json::from_str(line) {
        Ok(job) => job,
        Err(e) => {
            log::warn!("Line {line_id}: {e}");
            return Pending::Rejected(JobResult::error(line_id, e));
        },
    };
    let id = job.id.unwrap_or(line_id);

    let submitted = studio
        .request(&job.text, job.font.as_deref(), job.background.as_deref())
        .and_then(|request| studio.submit(request));
    match submitted {
        Ok(ticket) => Pending::Submitted(id, ticket),
        Err(e) => Pending::Rejected(JobResult::error(id, e)),
    }
}

struct ResultSink<'a, W: Write> {
    output_dir: &'a Path,
    /// Images already on disk from this batch
    written: HashSet<Fingerprint>,
    summary: BatchSummary,
    out: &'a mut W,
}

impl<W: Write> ResultSink<'_, W> {
    fn finish(&mut self, job: Pending) -> Result<()> {
        let result = match job {
            Pending::Rejected(result) => result,
            Pending::Submitted(id, ticket) => self.collect(id, ticket),
        };

        self.summary.jobs += 1;
        if result.is_ok() {
            self.summary.succeeded += 1;
        } else {
            self.summary.failed += 1;
        }

        serde_json::to_writer(&mut *self.out, &result).context("Failed to write JSON result")?;
        writeln!(self.out).context("Failed to write newline")
    }

    fn collect(&mut self, id: String, ticket: RenderTicket) -> JobResult {
        let fingerprint = ticket.fingerprint();
        let png = match ticket.wait() {
            Ok(png) => png,
            Err(e) => {
                log::warn!("Job {id} failed: {e}");
                return JobResult::error(id, e);
            },
        };

        let path = image_path(self.output_dir, &fingerprint);
        if !self.written.contains(&fingerprint) {
            if let Err(e) = fs::write(&path, png.as_slice()) {
                log::warn!("Job {id}: cannot write {}: {e}", path.display());
                return JobResult::error(id, format!("Failed to write {}: {e}", path.display()));
            }
            self.written.insert(fingerprint);
        }

        JobResult::ok(id, fingerprint.to_string(), path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use stanza::engine::{
        image::RgbaImage,
        traits::{GlyphMetrics, GlyphPainter},
        Background, Color, FontSpec, Registry, TextExtent,
    };
    use stanza::StanzaConfig;

    struct Blank;

    impl GlyphMetrics for Blank {
        fn measure(&self, line: &str) -> stanza::Result<TextExtent> {
            Ok(TextExtent::new(line.len() as f32 * 5.0, 10.0))
        }

        fn line_height(&self) -> f32 {
            10.0
        }
    }

    impl GlyphPainter for Blank {
        fn name(&self) -> &'static str {
            "blank"
        }

        fn draw_line(
            &self,
            _: &mut RgbaImage,
            _: &str,
            _: (f32, f32),
            _: Color,
        ) -> stanza::Result<()> {
            Ok(())
        }
    }

    fn studio() -> Studio {
        let registry = Registry::builder()
            .font(FontSpec::new("m1", 34.0, Arc::new(Blank)))
            .background(Background::new("default", RgbaImage::new(300, 300)))
            .build()
            .unwrap();
        let config = StanzaConfig {
            workers: Some(2),
            ..Default::default()
        };
        Studio::with_registry(config, Arc::new(registry)).unwrap()
    }

    fn lines(jobs: &str) -> impl Iterator<Item = io::Result<String>> + '_ {
        jobs.as_bytes().lines()
    }

    fn results(out: &[u8]) -> Vec<JobResult> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn numbered_jobs(count: usize) -> String {
        (0..count)
            .map(|i| format!("{{\"id\":\"{i}\",\"text\":\"poem {i}\"}}\n"))
            .collect()
    }

    #[test]
    fn duplicates_share_one_render_and_one_file() {
        let studio = studio();
        let dir = tempfile::tempdir().unwrap();
        let jobs = concat!(
            r#"{"id":"a","text":"same poem"}"#,
            "\n",
            r#"{"id":"b","text":"same poem","background":"missing"}"#,
            "\n\n",
            r#"{"id":"c","text":"other poem","font":"m1"}"#,
            "\n",
        );

        let mut out = Vec::new();
        let summary = process(&studio, lines(jobs), dir.path(), 8, &mut out).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                jobs: 3,
                succeeded: 3,
                failed: 0
            }
        );

        let results = results(&out);
        assert_eq!(
            results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
        assert_eq!(results[0].fingerprint, results[1].fingerprint);
        assert_ne!(results[0].fingerprint, results[2].fingerprint);
        assert_eq!(studio.service().cache().stats().renders, 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn bad_lines_become_error_results() {
        let studio = studio();
        let dir = tempfile::tempdir().unwrap();
        let jobs = concat!(
            "not json\n",
            r#"{"id":"blank","text":"  \r\n"}"#,
            "\n",
            r#"{"id":"font","text":"hi","font":"zz"}"#,
            "\n",
            r#"{"text":"fine"}"#,
            "\n",
        );

        let mut out = Vec::new();
        let summary = process(&studio, lines(jobs), dir.path(), 8, &mut out).unwrap();
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.succeeded, 1);

        let results = results(&out);
        assert_eq!(results[0].id, "1");
        assert!(!results[0].is_ok());
        assert!(results[1].error.as_deref().unwrap().contains("empty"));
        assert!(results[2].error.as_deref().unwrap().contains("zz"));
        assert_eq!(results[3].id, "4");
        assert!(results[3].is_ok());
        assert!(results[3].path.as_deref().unwrap().ends_with(".png"));
    }

    #[test]
    fn unwritable_output_fails_only_that_job() {
        let studio = studio();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created");

        let mut out = Vec::new();
        let summary = process(&studio, lines(&numbered_jobs(3)), &missing, 8, &mut out).unwrap();
        assert_eq!(summary.jobs, 3);
        assert_eq!(summary.failed, 3);

        let results = results(&out);
        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| r.error.as_deref().unwrap().contains("Failed to write")));
    }

    /// Remembers how many input lines had been read when output first appeared
    struct FirstWrite {
        consumed: Rc<Cell<usize>>,
        seen: Option<usize>,
        buf: Vec<u8>,
    }

    impl Write for FirstWrite {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.seen.get_or_insert(self.consumed.get());
            self.buf.write(data)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn results_stream_out_one_window_at_a_time() {
        let studio = studio();
        let dir = tempfile::tempdir().unwrap();
        let jobs = numbered_jobs(7);

        let consumed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&consumed);
        let input = lines(&jobs).inspect(move |_| counter.set(counter.get() + 1));
        let mut out = FirstWrite {
            consumed,
            seen: None,
            buf: Vec::new(),
        };

        let summary = process(&studio, input, dir.path(), 3, &mut out).unwrap();
        assert_eq!(summary.succeeded, 7);
        assert_eq!(out.seen, Some(3));

        let ids: Vec<String> = results(&out.buf).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4", "5", "6"]);
    }
}
