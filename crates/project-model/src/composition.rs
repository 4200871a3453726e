//! Composition inputs: clips, cutaways, and the composition file.
//!
//! A composition ties together a narration track, its script, and the
//! ordered clips whose media is cut to the narration. It is stored as a
//! single JSON document; media paths are relative to the document's
//! directory unless absolute.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::FrameGeometry;

/// A short inserted visual that replaces the picture (not the caption)
/// inside its parent clip's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutaway {
    /// Start time in seconds (narration time).
    pub start: f64,
    /// End time in seconds (narration time).
    pub end: f64,
    /// Media shown during the cutaway.
    #[serde(default)]
    pub source_media: Option<PathBuf>,
}

impl Cutaway {
    pub fn new(start: f64, end: f64, source_media: Option<PathBuf>) -> Self {
        Self {
            start,
            end,
            source_media,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// An ordered unit of narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique ordering key.
    pub sequence: u32,
    /// Start time in seconds (narration time).
    pub start: f64,
    /// End time in seconds (narration time).
    pub end: f64,
    /// Caption text.
    pub text: String,
    /// Media shown for this clip.
    #[serde(default)]
    pub source_media: Option<PathBuf>,
    /// Inserts, ordered by start.
    #[serde(default)]
    pub cutaways: Vec<Cutaway>,
}

impl Clip {
    pub fn new(
        sequence: u32,
        start: f64,
        end: f64,
        text: impl Into<String>,
        source_media: Option<PathBuf>,
    ) -> Self {
        Self {
            sequence,
            start,
            end,
            text: text.into(),
            source_media,
            cutaways: vec![],
        }
    }

    /// Builder-style cutaway attachment.
    pub fn with_cutaway(mut self, cutaway: Cutaway) -> Self {
        self.cutaways.push(cutaway);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Top-level composition document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    /// Schema version.
    pub version: String,

    /// Human-readable name.
    pub name: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Full narration script.
    #[serde(default)]
    pub script: String,

    /// Narration audio track.
    pub audio: PathBuf,

    /// Length of the output. Defaults to the narration length when absent.
    #[serde(default)]
    pub target_duration: Option<f64>,

    /// Output frame.
    pub frame: FrameGeometry,

    /// Output framerate.
    pub framerate: u32,

    /// Caption font size override.
    #[serde(default)]
    pub font_size: Option<f64>,

    /// Clips in any order; `sequence` decides placement.
    pub clips: Vec<Clip>,
}

impl Composition {
    /// Create an empty composition with defaults.
    pub fn new(name: impl Into<String>, audio: impl Into<PathBuf>, frame: FrameGeometry) -> Self {
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            script: String::new(),
            audio: audio.into(),
            target_duration: None,
            frame,
            framerate: 30,
            font_size: None,
            clips: vec![],
        }
    }

    /// Every media path referenced by clips and cutaways.
    pub fn media_references(&self) -> Vec<&Path> {
        let mut refs = vec![];
        for clip in &self.clips {
            if let Some(media) = &clip.source_media {
                refs.push(media.as_path());
            }
            for cutaway in &clip.cutaways {
                if let Some(media) = &cutaway.source_media {
                    refs.push(media.as_path());
                }
            }
        }
        refs
    }
}

/// A composition loaded from disk, with paths resolved.
#[derive(Debug, Clone)]
pub struct LoadedComposition {
    /// Path of the composition file.
    pub path: PathBuf,

    /// Directory relative media paths are resolved against.
    pub root: PathBuf,

    /// Document with every media path made absolute.
    pub composition: Composition,
}

impl LoadedComposition {
    /// Load a composition file and resolve its media paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CompositionError> {
        let path = path.as_ref().to_path_buf();
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let json = std::fs::read_to_string(&path).map_err(|e| CompositionError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let mut composition: Composition =
            serde_json::from_str(&json).map_err(|e| CompositionError::ParseError {
                path: path.clone(),
                source: e,
            })?;

        resolve_paths(&mut composition, &root);

        Ok(Self {
            path,
            root,
            composition,
        })
    }

    /// Write a composition document to `path`.
    pub fn create(
        path: impl AsRef<Path>,
        composition: Composition,
    ) -> Result<Self, CompositionError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CompositionError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json =
            serde_json::to_string_pretty(&composition).map_err(|e| CompositionError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        std::fs::write(&path, json).map_err(|e| CompositionError::IoError {
            path: path.clone(),
            source: e,
        })?;

        Self::load(path)
    }

    /// Validate that all referenced files exist.
    ///
    /// Missing clip media is reported but not fatal; the timeline degrades
    /// those clips to filler.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        if !self.composition.audio.exists() {
            errors.push(format!(
                "Narration audio missing: {}",
                self.composition.audio.display()
            ));
        }

        for clip in &self.composition.clips {
            if let Some(media) = &clip.source_media {
                if !media.exists() {
                    errors.push(format!(
                        "Clip {} media missing: {}",
                        clip.sequence,
                        media.display()
                    ));
                }
            }
            for (index, cutaway) in clip.cutaways.iter().enumerate() {
                if let Some(media) = &cutaway.source_media {
                    if !media.exists() {
                        errors.push(format!(
                            "Clip {} cutaway #{index} media missing: {}",
                            clip.sequence,
                            media.display()
                        ));
                    }
                }
            }
        }

        errors
    }
}

fn resolve_paths(composition: &mut Composition, root: &Path) {
    let resolve = |p: &mut PathBuf| {
        if p.is_relative() {
            *p = root.join(&*p);
        }
    };

    resolve(&mut composition.audio);
    for clip in &mut composition.clips {
        if let Some(media) = clip.source_media.as_mut() {
            resolve(media);
        }
        for cutaway in &mut clip.cutaways {
            if let Some(media) = cutaway.source_media.as_mut() {
                resolve(media);
            }
        }
    }
}

/// Errors that can occur when working with composition files.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Composition {
        let mut composition =
            Composition::new("Demo", "narration.wav", FrameGeometry::landscape_hd());
        composition.script = "Hello world. Second clip. Done.".to_string();
        composition.clips = vec![
            Clip::new(1, 0.0, 4.0, "Hello world", Some(PathBuf::from("media/a.mp4"))),
            Clip::new(2, 5.0, 8.0, "Second clip", Some(PathBuf::from("media/b.mp4")))
                .with_cutaway(Cutaway::new(6.0, 6.5, Some(PathBuf::from("media/c.mp4")))),
            Clip::new(3, 8.0, 10.0, "Done", None),
        ];
        composition
    }

    #[test]
    fn test_create_and_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composition.json");

        let loaded = LoadedComposition::create(&path, sample()).unwrap();
        assert_eq!(loaded.composition.clips.len(), 3);
        assert_eq!(loaded.composition.audio, dir.path().join("narration.wav"));
        assert_eq!(
            loaded.composition.clips[1].cutaways[0].source_media,
            Some(dir.path().join("media/c.mp4"))
        );
    }

    #[test]
    fn test_validate_sources_reports_missing_media() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composition.json");
        let loaded = LoadedComposition::create(&path, sample()).unwrap();

        let errors = loaded.validate_sources();
        assert!(errors.iter().any(|e| e.contains("Narration audio missing")));
        assert!(errors.iter().any(|e| e.contains("Clip 2 cutaway #0")));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let json = r#"{
            "version": "1.0",
            "name": "Minimal",
            "created_at": "2026-01-01T00:00:00Z",
            "audio": "/tmp/a.wav",
            "frame": {"width": 1080, "height": 1920, "aspect": "portrait"},
            "framerate": 25,
            "clips": [{"sequence": 1, "start": 0.0, "end": 2.0, "text": "Hi"}]
        }"#;
        let composition: Composition = serde_json::from_str(json).unwrap();
        assert!(composition.target_duration.is_none());
        assert!(composition.clips[0].cutaways.is_empty());
        assert!(composition.clips[0].source_media.is_none());
        assert_eq!(composition.media_references().len(), 0);
    }
}
