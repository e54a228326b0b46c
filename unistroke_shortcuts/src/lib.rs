//! The data plumbing around the [`unistroke`] recognizer: accumulating
//! pointer samples into finished strokes, mapping recognized gestures to
//! words, and persisting template libraries as JSON.
//!
//! None of this renders anything. A UI layer feeds pointer positions
//! into a [`StrokeRecorder`], hands the finished stroke to a
//! [`ShortcutMap`], and decides what to do with the word that comes
//! back.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unistroke::{Path2D, PathCoord, Recognizer, RecognizerConfig, Template, TemplateError};

/// Strokes shorter than this are not worth recognizing; a couple of
/// samples is a tap or a stray pointer event, not a gesture.
pub const MIN_STROKE_POINTS: usize = 5;

/// Score below which a recognition result is not acted on.
pub const DEFAULT_ACCEPT_THRESHOLD: PathCoord = 0.7;

/// Accumulates pointer samples into a stroke between an explicit start
/// and finish. Consecutive duplicate samples are dropped, since capture
/// layers commonly report the same position many times.
#[derive(Default, Debug)]
pub struct StrokeRecorder {
    current: Option<Path2D>,
}

impl StrokeRecorder {
    pub fn new() -> StrokeRecorder {
        StrokeRecorder::default()
    }

    /// Begin a new stroke, discarding any recording in progress.
    pub fn start(&mut self) {
        self.current = Some(Path2D::default());
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Append a pointer sample to the stroke in progress. Ignored when
    /// not recording or when the sample repeats the previous position.
    pub fn push(&mut self, x: PathCoord, y: PathCoord) {
        if let Some(ref mut path) = self.current {
            if path.is_new_point(x, y) {
                path.push(x, y);
            }
        }
    }

    /// End the stroke in progress and return it, or `None` if recording
    /// was never started.
    pub fn finish(&mut self) -> Option<Path2D> {
        self.current.take()
    }

    /// Throw away the stroke in progress.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}

#[derive(Error, Debug)]
pub enum ShortcutError {
    /// The stroke had too few points to register as a shortcut gesture.
    #[error("stroke has {0} points, need at least {MIN_STROKE_POINTS}")]
    StrokeTooShort(usize),
    /// The stroke could not be encoded into an entry key.
    #[error("failed to encode stroke key: {0}")]
    Key(#[from] serde_json::Error),
}

/// A successful shortcut lookup: the word mapped to the matched gesture
/// and the similarity score that cleared the accept threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortcutMatch<'a> {
    pub word: &'a str,
    pub score: PathCoord,
}

/// Maps drawn gestures to words over an owned [`Recognizer`].
///
/// Each registered stroke becomes its own template keyed by the JSON
/// serialization of its raw points, so two examples of the same word
/// are independent entries and a single example can be deleted without
/// touching the others.
#[derive(Debug)]
pub struct ShortcutMap {
    recognizer: Recognizer,
    words: HashMap<String, String>,
    accept_threshold: PathCoord,
}

impl Default for ShortcutMap {
    fn default() -> ShortcutMap {
        ShortcutMap::new()
    }
}

impl ShortcutMap {
    /// A shortcut map with default recognizer settings and the default
    /// accept threshold.
    pub fn new() -> ShortcutMap {
        ShortcutMap::with_config(RecognizerConfig::default(), DEFAULT_ACCEPT_THRESHOLD)
    }

    /// A shortcut map with explicit recognizer settings and accept
    /// threshold. Observed deployments sit between 0.5 and 0.7; lower
    /// values accept sloppier strokes and more false positives.
    pub fn with_config(config: RecognizerConfig, accept_threshold: PathCoord) -> ShortcutMap {
        ShortcutMap {
            recognizer: Recognizer::with_config(config),
            words: HashMap::new(),
            accept_threshold,
        }
    }

    pub fn accept_threshold(&self) -> PathCoord {
        self.accept_threshold
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    /// Register a stroke so that drawing it produces `word`. Returns the
    /// opaque entry key under which the example was stored; pass it to
    /// [`remove_shortcut`](ShortcutMap::remove_shortcut) to delete this
    /// example again.
    pub fn add_shortcut(&mut self, word: &str, points: &Path2D) -> Result<String, ShortcutError> {
        if points.len() < MIN_STROKE_POINTS {
            return Err(ShortcutError::StrokeTooShort(points.len()));
        }
        let key = serde_json::to_string(&points.points())?;
        self.recognizer.add_gesture_with_key(word, &key, points);
        self.words.insert(key.clone(), word.to_owned());
        Ok(key)
    }

    /// Delete the single gesture example stored under `key`. Returns
    /// true if it existed.
    pub fn remove_shortcut(&mut self, key: &str) -> bool {
        let removed = self.recognizer.remove_gesture_by_key(key);
        self.words.remove(key);
        removed
    }

    /// Recognize a finished stroke and return the word it maps to, if
    /// any example matched at or above the accept threshold. Short
    /// strokes and weak matches both come back as `None`.
    pub fn lookup(&self, points: &Path2D) -> Option<ShortcutMatch<'_>> {
        if points.len() < MIN_STROKE_POINTS {
            debug!("lookup: stroke has {} points, below minimum", points.len());
            return None;
        }
        let result = self.recognizer.recognize(points);
        let template = result.template?;
        if result.score < self.accept_threshold {
            debug!(
                "lookup: best match {:?} scored {}, below threshold {}",
                template.name, result.score, self.accept_threshold
            );
            return None;
        }
        let word = self.words.get(template.key.as_deref()?)?;
        Some(ShortcutMatch {
            word,
            score: result.score,
        })
    }

    /// Iterate the registered examples as (entry key, word) pairs.
    pub fn shortcuts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.words
            .iter()
            .map(|(key, word)| (key.as_str(), word.as_str()))
    }
}

/// One stored template: a gesture name and its normalized points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub path: Vec<(PathCoord, PathCoord)>,
}

/// A serializable collection of templates, stored in normalized form so
/// loading never re-runs the preprocessing pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateLibrary {
    pub templates: Vec<TemplateData>,
}

#[derive(Error, Debug)]
pub enum LibraryError {
    /// A stored template had an unusable path.
    #[error("stored template is invalid: {0}")]
    Template(#[from] TemplateError),
    #[error("library serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateLibrary {
    /// Snapshot every template currently held by a recognizer.
    pub fn from_recognizer(recognizer: &Recognizer) -> TemplateLibrary {
        TemplateLibrary {
            templates: recognizer
                .store()
                .iter()
                .map(|template| TemplateData {
                    name: template.name.clone(),
                    key: template.key.clone(),
                    path: template.path.points(),
                })
                .collect(),
        }
    }

    /// Register every stored template with a recognizer, in order. The
    /// stored points are already normalized and are taken as-is.
    pub fn load_into(&self, recognizer: &mut Recognizer) -> Result<(), LibraryError> {
        for data in &self.templates {
            let path = Path2D::from_points(&data.path);
            let mut template = Template::from_normalized(data.name.clone(), path)?;
            if let Some(ref key) = data.key {
                template = template.with_key(key.clone());
            }
            recognizer.add_template(template);
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<TemplateLibrary, LibraryError> {
        Ok(serde_json::from_str(json)?)
    }
}
