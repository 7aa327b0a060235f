use likesync_core::domain::{SyncRun, TrackSnapshot};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

// ============================================================================
// Shared renderings
// ============================================================================

/// JSON view of a sync run, including the derived duration
pub fn run_json(run: &SyncRun) -> serde_json::Value {
    serde_json::json!({
        "id": run.id().to_string(),
        "status": run.status().as_str(),
        "started_at": run.started_at().to_rfc3339(),
        "completed_at": run.completed_at().map(|t| t.to_rfc3339()),
        "duration_seconds": run.duration_seconds(),
        "tracks_added": run.tracks_added(),
        "tracks_updated": run.tracks_updated(),
        "tracks_removed": run.tracks_removed(),
        "tracks_skipped": run.tracks_skipped(),
        "total_tracks_processed": run.total_tracks_processed(),
        "error_message": run.error_message(),
        "error_kind": run.error_kind().map(|k| k.as_str()),
    })
}

/// One-line summary of a sync run
pub fn run_line(run: &SyncRun) -> String {
    let duration = run
        .duration_seconds()
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{}  {:<9}  +{} ~{} -{}  ({} processed, {})",
        run.started_at().format("%Y-%m-%d %H:%M:%S"),
        run.status().as_str(),
        run.tracks_added(),
        run.tracks_updated(),
        run.tracks_removed(),
        run.total_tracks_processed(),
        duration
    )
}

/// JSON view of a stored track
pub fn track_json(track: &TrackSnapshot) -> serde_json::Value {
    let meta = track.metadata();
    serde_json::json!({
        "remote_id": track.remote_id().as_str(),
        "title": meta.title,
        "artist_name": meta.artist_name,
        "album_name": meta.album_name,
        "artwork_url": meta.artwork_url,
        "preview_url": meta.preview_url,
        "external_url": meta.external_url,
        "duration_ms": meta.duration_ms,
        "is_currently_liked": track.is_currently_liked(),
        "liked_at": track.liked_at().map(|t| t.to_rfc3339()),
    })
}

/// One-line summary of a stored track
pub fn track_line(track: &TrackSnapshot) -> String {
    let liked = track
        .liked_at()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    let marker = if track.is_currently_liked() {
        ""
    } else {
        "  (unliked)"
    };

    format!(
        "{}  {} - {}{}",
        liked,
        track.artist_name(),
        track.title(),
        marker
    )
}

pub fn format_duration(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{:.1}s", seconds)
    } else {
        format!("{}ms", (seconds * 1000.0).round() as u64)
    }
}
