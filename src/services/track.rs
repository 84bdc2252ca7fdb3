// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track-file rendering for uploads.

use crate::error::AppError;
use crate::models::Activity;
use crate::time_utils::format_dailymile_time;
use std::fmt::Write;

/// Format name used for pre-rendered track lookups.
pub const GPX_FORMAT: &str = "gpx";

/// Serializes an activity's trajectory into a track file.
pub trait TrackRenderer: Send + Sync {
    fn render(&self, activity: &Activity) -> Result<Vec<u8>, AppError>;
}

/// Minimal GPX 1.1 writer: one track, one segment per lap.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpxRenderer;

impl TrackRenderer for GpxRenderer {
    fn render(&self, activity: &Activity) -> Result<Vec<u8>, AppError> {
        let mut gpx = String::new();
        write_gpx(&mut gpx, activity).map_err(|e| AppError::TrackRender(e.to_string()))?;
        Ok(gpx.into_bytes())
    }
}

fn write_gpx(out: &mut String, activity: &Activity) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<gpx version="1.1" creator="dailymile-sync" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;
    writeln!(
        out,
        "  <metadata><time>{}</time></metadata>",
        format_dailymile_time(&activity.start_time)
    )?;
    writeln!(out, "  <trk>")?;
    if let Some(name) = activity.name.as_deref() {
        writeln!(out, "    <name>{}</name>", escape_xml(name))?;
    }
    for lap in &activity.laps {
        writeln!(out, "    <trkseg>")?;
        for wp in &lap.waypoints {
            write!(
                out,
                r#"      <trkpt lat="{}" lon="{}">"#,
                wp.latitude, wp.longitude
            )?;
            if let Some(ele) = wp.altitude {
                write!(out, "<ele>{}</ele>", ele)?;
            }
            writeln!(out, "<time>{}</time></trkpt>", format_dailymile_time(&wp.timestamp))?;
        }
        writeln!(out, "    </trkseg>")?;
    }
    writeln!(out, "  </trk>")?;
    writeln!(out, "</gpx>")
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
