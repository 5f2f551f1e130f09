// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//
// Stacks the waveforms of all signals into a single SVG document.

use crate::render::{render_signal, Lane, WavePath};
use crate::timeline::{Time, Timeline};
use crate::{RenderOptions, Result, VcdPlotError};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// CSS class of every waveform path.
pub const WAVEFORM_CLASS: &str = "waveform";
/// CSS class of the two axis lines.
pub const AXIS_CLASS: &str = "axis";

#[derive(Debug, Clone, PartialEq)]
pub struct LanePath {
    pub label: String,
    pub path: WavePath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLine {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Stylesheet {
    /// absolute path, the link is computed when the document is written
    Linked(PathBuf),
    Embedded(String),
}

/// A composed waveform diagram, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    max_time: Time,
    width: f64,
    height: f64,
    margin: f64,
    paths: Vec<LanePath>,
    time_axis: AxisLine,
    level_axis: AxisLine,
    stylesheet: Stylesheet,
}

fn load_stylesheet(options: &RenderOptions) -> Result<Stylesheet> {
    let path = &options.stylesheet;
    if !path.is_file() {
        return Err(VcdPlotError::MissingStylesheet(path.clone()));
    }
    if options.embed_stylesheet {
        Ok(Stylesheet::Embedded(std::fs::read_to_string(path)?))
    } else {
        Ok(Stylesheet::Linked(std::fs::canonicalize(path)?))
    }
}

/// Lays out one lane per signal in timeline order. Fails if the stylesheet cannot be found.
pub fn compose(timeline: &Timeline, options: &RenderOptions) -> Result<Document> {
    let stylesheet = load_stylesheet(options)?;
    let max_time = timeline.max_time();

    let lane = |index: usize| Lane {
        // baseline of the lane, high levels are drawn above
        offset: options.margin + index as f64 * options.lane_pitch + options.level_height,
        scale: -options.level_height,
        time_scale: options.time_scale,
    };
    let draw = |(index, signal): (usize, &crate::Signal)| {
        render_signal(signal.history(), &lane(index), max_time).map(|path| LanePath {
            label: signal.label().to_string(),
            path,
        })
    };
    // collect keeps the timeline order, independent of how lanes are scheduled
    let paths: Vec<LanePath> = if options.multi_thread {
        timeline
            .signals()
            .par_iter()
            .enumerate()
            .filter_map(draw)
            .collect()
    } else {
        timeline.iter().enumerate().filter_map(draw).collect()
    };
    log::debug!(
        "Rendered {} of {} signals up to time {max_time}.",
        paths.len(),
        timeline.len()
    );

    let right = max_time as f64 * options.time_scale;
    let bottom = options.margin + timeline.len() as f64 * options.lane_pitch;
    let time_axis = AxisLine {
        from: (0.0, bottom),
        to: (right, bottom),
    };
    let level_axis = AxisLine {
        from: (0.0, 0.0),
        to: (0.0, bottom),
    };

    Ok(Document {
        max_time,
        width: right + 2.0 * options.margin,
        height: bottom + options.margin,
        margin: options.margin,
        paths,
        time_axis,
        level_axis,
        stylesheet,
    })
}

impl Document {
    pub fn max_time(&self) -> Time {
        self.max_time
    }

    pub fn paths(&self) -> &[LanePath] {
        &self.paths
    }

    pub fn time_axis(&self) -> AxisLine {
        self.time_axis
    }

    pub fn level_axis(&self) -> AxisLine {
        self.level_axis
    }

    /// Writes the document. A linked stylesheet is referenced by an absolute `file://` URL
    /// since the final location of the output is unknown. Use [`Document::save`] for a
    /// relative link.
    pub fn write_svg(&self, out: &mut impl Write) -> std::io::Result<()> {
        let href = match &self.stylesheet {
            Stylesheet::Linked(path) => Some(file_url(path)),
            Stylesheet::Embedded(_) => None,
        };
        self.write_svg_with_href(out, href.as_deref())
    }

    fn write_svg_with_href(
        &self,
        out: &mut impl Write,
        href: Option<&str>,
    ) -> std::io::Result<()> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        if let Some(href) = href {
            writeln!(
                out,
                r#"<?xml-stylesheet type="text/css" href="{}"?>"#,
                escape(href)
            )?;
        }
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
            x = -self.margin,
        )?;
        if let Stylesheet::Embedded(css) = &self.stylesheet {
            // `]]>` would end the section early
            let css = css.replace("]]>", "]]]]><![CDATA[>");
            writeln!(out, "<style><![CDATA[\n{css}\n]]></style>")?;
        }
        for lane in self.paths.iter() {
            writeln!(
                out,
                r#"<path class="{WAVEFORM_CLASS}" d="{}"><title>{}</title></path>"#,
                lane.path.to_path_data(),
                escape(&lane.label)
            )?;
        }
        for axis in [self.time_axis, self.level_axis] {
            writeln!(
                out,
                r#"<line class="{AXIS_CLASS}" x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
                axis.from.0, axis.from.1, axis.to.0, axis.to.1
            )?;
        }
        writeln!(out, "</svg>")
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = Vec::new();
        // writing into a Vec does not fail
        let _ = self.write_svg(&mut out);
        String::from_utf8_lossy(&out).to_string()
    }

    /// Writes the document to `filename`. A linked stylesheet is referenced relative to the
    /// folder of `filename`, so that viewers find it next to the output.
    pub fn save<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let filename = filename.as_ref();
        let file = std::fs::File::create(filename)?;
        let href = match &self.stylesheet {
            Stylesheet::Linked(path) => {
                let folder = match filename.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                let folder = std::fs::canonicalize(folder)?;
                Some(relative_href(path, &folder).unwrap_or_else(|| file_url(path)))
            }
            Stylesheet::Embedded(_) => None,
        };
        log::debug!("Linking stylesheet as {href:?}");
        let mut out = std::io::BufWriter::new(file);
        self.write_svg_with_href(&mut out, href.as_deref())?;
        out.flush()?;
        Ok(())
    }
}

/// Path of `target` as seen from `folder`, both absolute. `None` if they share no root.
fn relative_href(target: &Path, folder: &Path) -> Option<String> {
    let target: Vec<Component> = target.components().collect();
    let folder: Vec<Component> = folder.components().collect();
    let common = target
        .iter()
        .zip(folder.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return None;
    }
    let mut parts: Vec<String> = vec!["..".to_string(); folder.len() - common];
    for component in &target[common..] {
        match component {
            Component::Normal(name) => parts.push(encode_url_path(&name.to_string_lossy())),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{}", encode_url_path(&path))
    } else {
        format!("file:///{}", encode_url_path(&path))
    }
}

fn encode_url_path(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                out.push(b as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_str, LoadOptions};
    use std::path::PathBuf;

    fn options_with_stylesheet(dir: &tempfile::TempDir) -> RenderOptions {
        let stylesheet = dir.path().join("style.css");
        std::fs::write(&stylesheet, ".waveform { stroke: black; }").unwrap();
        RenderOptions {
            stylesheet,
            ..Default::default()
        }
    }

    fn timeline(input: &str) -> Timeline {
        parse_str(input, &LoadOptions::default()).unwrap().timeline
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape("clk"), "clk");
    }

    #[test]
    fn test_relative_href() {
        let href = relative_href(
            Path::new("/home/user/styles/wave.css"),
            Path::new("/home/user/out/svg"),
        );
        assert_eq!(href.as_deref(), Some("../../styles/wave.css"));
        let href = relative_href(Path::new("/data/style.css"), Path::new("/data"));
        assert_eq!(href.as_deref(), Some("style.css"));
        let href = relative_href(Path::new("/data/my style.css"), Path::new("/"));
        assert_eq!(href.as_deref(), Some("data/my%20style.css"));
        assert_eq!(relative_href(Path::new("style.css"), Path::new("/data")), None);
    }

    #[test]
    fn test_file_url() {
        assert_eq!(file_url(Path::new("/a b/style.css")), "file:///a%20b/style.css");
    }

    #[test]
    fn test_missing_stylesheet() {
        let options = RenderOptions {
            stylesheet: PathBuf::from("does/not/exist.css"),
            ..Default::default()
        };
        let r = compose(&timeline("$var wire 1 ! clk $end\n1!"), &options);
        assert!(matches!(r, Err(VcdPlotError::MissingStylesheet(_))));
    }

    #[test]
    fn test_lanes_and_axes() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_with_stylesheet(&dir);
        let input = "$var wire 1 ! a $end\n$var wire 1 \" unused $end\n$var wire 1 # c $end\n#0\n1!\n0#\n#6\n1#";
        let doc = compose(&timeline(input), &options).unwrap();
        assert_eq!(doc.max_time(), 6);
        // the signal without changes still takes up a lane
        let labels: Vec<&str> = doc.paths().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["a", "c"]);
        assert_eq!(
            doc.paths()[1].path.to_path_data(),
            "M0,60 L6,60 L6,50 L6,50"
        );
        assert_eq!(
            doc.time_axis(),
            AxisLine {
                from: (0.0, 70.0),
                to: (6.0, 70.0)
            }
        );
        assert_eq!(
            doc.level_axis(),
            AxisLine {
                from: (0.0, 0.0),
                to: (0.0, 70.0)
            }
        );
    }

    #[test]
    fn test_single_and_multi_thread_agree() {
        let dir = tempfile::tempdir().unwrap();
        let multi = options_with_stylesheet(&dir);
        let single = RenderOptions {
            multi_thread: false,
            ..multi.clone()
        };
        let mut input = String::new();
        for ii in 0..64u8 {
            let symbol = (b'!' + ii) as char;
            input.push_str(&format!("$var wire 1 {symbol} s{ii} $end\n"));
        }
        for time in 0..32u64 {
            input.push_str(&format!("#{time}\n"));
            let symbol = (b'!' + (time as u8 * 7) % 64) as char;
            input.push_str(&format!("{}{symbol}\n", time % 2));
        }
        let t = timeline(&input);
        assert_eq!(compose(&t, &multi).unwrap(), compose(&t, &single).unwrap());
    }

    #[test]
    fn test_write_svg() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_with_stylesheet(&dir);
        let doc = compose(&timeline("$var wire 1 ! a&b $end\n#0\n1!\n#4\n0!"), &options).unwrap();
        let svg = doc.to_svg_string();
        assert!(svg.contains("<?xml-stylesheet"));
        assert!(svg.contains(r#"<path class="waveform" d="M0,10 L4,10 L4,20 L4,20"><title>a&amp;b</title></path>"#));
        assert_eq!(svg.matches("<line class=\"axis\"").count(), 2);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_embedded_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let options = RenderOptions {
            embed_stylesheet: true,
            ..options_with_stylesheet(&dir)
        };
        let doc = compose(&Timeline::default(), &options).unwrap();
        let svg = doc.to_svg_string();
        assert!(!svg.contains("<?xml-stylesheet"));
        assert!(svg.contains(".waveform { stroke: black; }"));
        assert!(doc.paths().is_empty());
        assert_eq!(doc.max_time(), 0);
    }

    #[test]
    fn test_embedded_stylesheet_cannot_close_cdata() {
        let dir = tempfile::tempdir().unwrap();
        let stylesheet = dir.path().join("tricky.css");
        std::fs::write(&stylesheet, "/* ]]> */ .axis { stroke: gray; }").unwrap();
        let options = RenderOptions {
            stylesheet,
            embed_stylesheet: true,
            ..Default::default()
        };
        let svg = compose(&Timeline::default(), &options)
            .unwrap()
            .to_svg_string();
        // the only CDATA terminators are the split one and the closing one
        assert!(svg.contains("/* ]]]]><![CDATA[> */ .axis { stroke: gray; }"));
        assert_eq!(svg.matches("]]>").count(), 2);
        assert!(svg.contains("\n]]></style>"));
    }
}
