//! Single-stroke gesture recognition against a library of recorded
//! example strokes, in the style of the `$1 unistroke recognizer`.
//!
//! A raw stroke is resampled to a fixed point count, rotated so its
//! indicative angle is zero, scaled into a reference square, and
//! translated so its centroid sits at the origin. Recognition compares
//! the normalized query against every stored [`Template`] with a
//! golden-section search over a bounded rotation window and reports the
//! closest one as a [`MatchResult`].

use euclid::Angle;
use euclid::default::{Box2D, Point2D};
use log::{debug, trace};
use thiserror::Error;

/// Scalar type used for stroke coordinates.
pub type PathCoord = f32;

/// Default number of points a stroke is resampled to before matching.
pub const DEFAULT_RESAMPLE_POINTS: usize = 64;
/// Default side length of the normalization reference square.
pub const DEFAULT_SQUARE_SIZE: PathCoord = 250.0;
/// Default rotation window searched on either side of zero, in degrees.
pub const DEFAULT_ANGLE_RANGE: f32 = 45.0;
/// Default termination width of the angular search, in degrees.
pub const DEFAULT_ANGLE_PRECISION: f32 = 2.0;

/// A 2d stroke: an ordered sequence of (x, y) points in drawing order.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Path2D {
    points: Vec<Point2D<PathCoord>>,
}

impl Path2D {
    /// Create a path from a slice of (x, y) pairs, preserving order.
    pub fn from_points(points: &[(PathCoord, PathCoord)]) -> Path2D {
        Path2D {
            points: points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
        }
    }

    /// Returns the list of points that make up this path.
    pub fn points(&self) -> Vec<(PathCoord, PathCoord)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }

    /// Append a point to the end of this path.
    pub fn push(&mut self, x: PathCoord, y: PathCoord) {
        self.points.push(Point2D::new(x, y));
    }

    /// Returns true if the provided point differs from the last point in
    /// this path. Capture layers use this to drop repeated samples.
    pub fn is_new_point(&self, x: PathCoord, y: PathCoord) -> bool {
        self.points
            .last()
            .map_or(true, |last| *last != Point2D::new(x, y))
    }

    /// Number of points in this path.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if this path contains no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn length(&self) -> PathCoord {
        self.points
            .windows(2)
            .map(|pair| pair[1].distance_to(pair[0]))
            .sum()
    }

    fn centroid(&self) -> Point2D<PathCoord> {
        let mut sum_x: PathCoord = 0.0;
        let mut sum_y: PathCoord = 0.0;
        for point in &self.points {
            sum_x += point.x;
            sum_y += point.y;
        }
        let count = self.points.len() as PathCoord;
        Point2D::new(sum_x / count, sum_y / count)
    }

    /// Angle from the centroid to the first point.
    fn indicative_angle(&self) -> f32 {
        let centroid = self.centroid();
        let first = self.points[0];
        (centroid.y - first.y).atan2(centroid.x - first.x)
    }

    /// Rewalk the path and emit `num_points` points spaced evenly by arc
    /// length. The first input point is always the first output point.
    fn resample(&self, num_points: usize) -> Path2D {
        let interval = self.length() / (num_points - 1) as PathCoord;
        let mut resampled = Path2D {
            points: vec![self.points[0]],
        };

        // A stroke whose points all coincide has no arc to walk; emit
        // copies and let matching score it near zero.
        if interval <= 0.0 {
            resampled.points.resize(num_points, self.points[0]);
            return resampled;
        }

        let mut walked: PathCoord = 0.0;
        let mut remaining = self.points.clone();
        let mut i = 1;
        while i < remaining.len() {
            let prev = remaining[i - 1];
            let curr = remaining[i];
            let segment = curr.distance_to(prev);
            if walked + segment > interval {
                let t = (interval - walked) / segment;
                let emitted = Point2D::new(
                    prev.x + t * (curr.x - prev.x),
                    prev.y + t * (curr.y - prev.y),
                );
                resampled.points.push(emitted);
                // The emitted point becomes the start of the next segment.
                remaining.insert(i, emitted);
                walked = 0.0;
            } else {
                walked += segment;
            }
            i += 1;
        }

        // Floating-point drift can leave the walk a point or two short.
        let last = *remaining.last().unwrap_or(&self.points[0]);
        while resampled.points.len() < num_points {
            resampled.points.push(last);
        }
        resampled
    }

    fn rotate_by(&self, radians: f32) -> Path2D {
        let centroid = self.centroid();
        let (sin, cos) = radians.sin_cos();
        Path2D {
            points: self
                .points
                .iter()
                .map(|point| {
                    let offset = *point - centroid;
                    Point2D::new(
                        offset.x * cos - offset.y * sin + centroid.x,
                        offset.x * sin + offset.y * cos + centroid.y,
                    )
                })
                .collect(),
        }
    }

    /// Scale each axis independently so the bounding box becomes a
    /// `size` × `size` square. Degenerate boxes divide by 1 instead of 0.
    fn scale_to_square(&self, size: PathCoord) -> Path2D {
        let bounds = self.bounding_rect();
        let width = bounds.width().max(1.0);
        let height = bounds.height().max(1.0);
        Path2D {
            points: self
                .points
                .iter()
                .map(|point| Point2D::new(point.x * (size / width), point.y * (size / height)))
                .collect(),
        }
    }

    fn translate_to(&self, dest: Point2D<PathCoord>) -> Path2D {
        let centroid = self.centroid();
        Path2D {
            points: self
                .points
                .iter()
                .map(|point| *point + (dest - centroid))
                .collect(),
        }
    }

    fn bounding_rect(&self) -> Box2D<PathCoord> {
        let mut min = Point2D::new(PathCoord::MAX, PathCoord::MAX);
        let mut max = Point2D::new(PathCoord::MIN, PathCoord::MIN);
        for point in &self.points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Box2D::new(min, max)
    }

    /// Probe one golden-section point of the bracket `[a, b]` and return
    /// the probe angle together with the distance when rotated there.
    fn probe(&self, a: f32, b: f32, template: &Path2D) -> (f32, f32) {
        let phi = 0.5f32 * (-1.0 + 5.0f32.sqrt());
        let x = phi * a + (1.0 - phi) * b;
        (x, self.distance_at_angle(template, x))
    }

    /// Golden-section search for the rotation in `[from_angle, to_angle]`
    /// that minimizes the path distance to `template`, narrowing the
    /// bracket until it is smaller than `threshold` radians.
    fn distance_at_best_angle(
        &self,
        template: &Path2D,
        mut from_angle: f32,
        mut to_angle: f32,
        threshold: f32,
    ) -> f32 {
        let (mut x1, mut f1) = self.probe(from_angle, to_angle, template);
        let (mut x2, mut f2) = self.probe(to_angle, from_angle, template);

        while (to_angle - from_angle).abs() > threshold {
            if f1 < f2 {
                to_angle = x2;
                x2 = x1;
                f2 = f1;
                (x1, f1) = self.probe(from_angle, to_angle, template);
            } else {
                from_angle = x1;
                x1 = x2;
                f1 = f2;
                (x2, f2) = self.probe(to_angle, from_angle, template);
            }
        }
        f1.min(f2)
    }

    fn distance_at_angle(&self, template: &Path2D, radians: f32) -> f32 {
        self.rotate_by(radians).path_distance(template)
    }

    /// Mean distance between index-aligned points of two equal-length
    /// paths. Unequal lengths cannot be compared and report the maximum
    /// distance instead.
    fn path_distance(&self, other: &Path2D) -> f32 {
        if self.points.len() != other.points.len() {
            return f32::MAX;
        }
        let total: f32 = self
            .points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| b.distance_to(*a))
            .sum();
        total / self.points.len() as f32
    }
}

/// Tuning knobs for a [`Recognizer`], fixed at construction. Templates
/// registered under one configuration are only comparable to queries
/// preprocessed under the same configuration.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Number of points every stroke is resampled to. Higher values
    /// increase fidelity and per-template match cost.
    pub resample_points: usize,
    /// Side length of the square strokes are scaled into.
    pub square_size: PathCoord,
    /// Rotation searched on either side of zero during matching, degrees.
    pub angle_range: f32,
    /// Bracket width at which the angular search stops, degrees.
    pub angle_precision: f32,
}

impl Default for RecognizerConfig {
    fn default() -> RecognizerConfig {
        RecognizerConfig {
            resample_points: DEFAULT_RESAMPLE_POINTS,
            square_size: DEFAULT_SQUARE_SIZE,
            angle_range: DEFAULT_ANGLE_RANGE,
            angle_precision: DEFAULT_ANGLE_PRECISION,
        }
    }
}

impl RecognizerConfig {
    /// Half the diagonal of the reference square; the distance that maps
    /// to a similarity score of zero.
    fn half_diagonal(&self) -> PathCoord {
        0.5 * (2.0 * self.square_size * self.square_size).sqrt()
    }
}

/// Resample + rotate + scale + translate. Templates and queries both go
/// through this exact pipeline; comparing strokes normalized any other
/// way is invalid.
fn normalize(points: &Path2D, config: &RecognizerConfig) -> Path2D {
    let resampled = points.resample(config.resample_points);
    let radians = resampled.indicative_angle();
    let rotated = resampled.rotate_by(-radians);
    let scaled = rotated.scale_to_square(config.square_size);
    scaled.translate_to(Point2D::default())
}

#[derive(Error, Debug)]
pub enum TemplateError {
    /// The provided path had fewer than the two points needed to define
    /// a stroke.
    #[error("gesture path needs at least 2 points")]
    TooFewPoints,
}

/// A normalized reference stroke registered under a display name.
#[derive(Debug, Clone)]
pub struct Template {
    /// Display name of the gesture. Several templates may share a name;
    /// each acts as an independent candidate for it.
    pub name: String,
    /// Optional opaque key identifying this entry alone, for callers
    /// that delete individual example strokes rather than whole names.
    pub key: Option<String>,
    /// The normalized points of this gesture.
    pub path: Path2D,
}

impl Template {
    /// Create a normalized template from a raw stroke.
    pub fn new(
        name: String,
        points: &Path2D,
        config: &RecognizerConfig,
    ) -> Result<Template, TemplateError> {
        if points.len() < 2 {
            return Err(TemplateError::TooFewPoints);
        }
        Ok(Template {
            name,
            key: None,
            path: normalize(points, config),
        })
    }

    /// Create a template from points that were already normalized, eg.
    /// when loading previously stored template data. The path is taken
    /// as-is and must not be normalized a second time.
    pub fn from_normalized(name: String, path: Path2D) -> Result<Template, TemplateError> {
        if path.len() < 2 {
            return Err(TemplateError::TooFewPoints);
        }
        Ok(Template {
            name,
            key: None,
            path,
        })
    }

    /// Attach an opaque per-entry key to this template.
    pub fn with_key(mut self, key: String) -> Template {
        self.key = Some(key);
        self
    }
}

/// Insertion-ordered collection of templates. Entries are appended, never
/// mutated; removal drops whole entries by name or key.
#[derive(Default, Debug, Clone)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    /// Append a template. Duplicate names are permitted and act as
    /// independent candidates during recognition.
    pub fn add(&mut self, template: Template) {
        self.templates.push(template);
    }

    /// Remove every template registered under `name`, returning how many
    /// entries were dropped.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.templates.len();
        self.templates.retain(|template| template.name != name);
        before - self.templates.len()
    }

    /// Remove the template carrying the per-entry key `key`. Returns true
    /// if an entry was dropped.
    pub fn remove_by_key(&mut self, key: &str) -> bool {
        let before = self.templates.len();
        self.templates
            .retain(|template| template.key.as_deref() != Some(key));
        self.templates.len() < before
    }

    /// Iterate templates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The outcome of a recognition call. `template` is `None` when the
/// store was empty or the query was too short to process; the score is
/// 0 in that case.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    /// The closest template, if any candidate existed.
    pub template: Option<&'a Template>,
    /// Similarity in roughly `[0, 1]`; 1 is an exact match. Pathological
    /// mismatches can push it slightly negative.
    pub score: PathCoord,
}

impl MatchResult<'_> {
    /// Display name of the matched template.
    pub fn name(&self) -> Option<&str> {
        self.template.map(|template| template.name.as_str())
    }

    /// Returns true if a template was matched at all.
    pub fn is_match(&self) -> bool {
        self.template.is_some()
    }

    fn none() -> MatchResult<'static> {
        MatchResult {
            template: None,
            score: 0.0,
        }
    }
}

/// A gesture recognizer owning its configuration and template store.
///
/// Recognition is a pure function of the query and the current store
/// contents: `recognize` takes `&self`, so registration cannot race a
/// scan and every call observes a consistent snapshot.
#[derive(Default, Debug, Clone)]
pub struct Recognizer {
    config: RecognizerConfig,
    store: TemplateStore,
}

impl Recognizer {
    /// A recognizer with the default configuration and no templates.
    pub fn new() -> Recognizer {
        Recognizer::default()
    }

    /// A recognizer with an explicit configuration and no templates.
    pub fn with_config(config: RecognizerConfig) -> Recognizer {
        Recognizer {
            config,
            store: TemplateStore::default(),
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Register a raw stroke as a new example of `name`. A stroke with
    /// fewer than 2 points cannot define a gesture and is dropped
    /// without error.
    pub fn add_gesture(&mut self, name: &str, points: &Path2D) {
        match Template::new(name.to_owned(), points, &self.config) {
            Ok(template) => {
                trace!("registered template {:?} ({} raw points)", name, points.len());
                self.store.add(template);
            }
            Err(err) => debug!("ignoring gesture {:?}: {}", name, err),
        }
    }

    /// Like [`add_gesture`](Recognizer::add_gesture), additionally
    /// tagging the entry with an opaque key for later per-entry removal.
    pub fn add_gesture_with_key(&mut self, name: &str, key: &str, points: &Path2D) {
        match Template::new(name.to_owned(), points, &self.config) {
            Ok(template) => {
                trace!("registered template {:?} under key {:?}", name, key);
                self.store.add(template.with_key(key.to_owned()));
            }
            Err(err) => debug!("ignoring gesture {:?}: {}", name, err),
        }
    }

    /// Add an already-constructed template, eg. one loaded from stored
    /// library data.
    pub fn add_template(&mut self, template: Template) {
        self.store.add(template);
    }

    /// Remove every example of `name`, returning the number removed.
    pub fn remove_gesture(&mut self, name: &str) -> usize {
        self.store.remove_by_name(name)
    }

    /// Remove the single entry registered under `key`.
    pub fn remove_gesture_by_key(&mut self, key: &str) -> bool {
        self.store.remove_by_key(key)
    }

    /// Find the template closest to a raw query stroke.
    ///
    /// The query runs through the same preprocessing as registration,
    /// then every template is compared over the configured rotation
    /// window; ties in distance keep the earlier-registered template.
    /// Degenerate input and an empty store both yield the no-match
    /// result rather than an error.
    pub fn recognize(&self, points: &Path2D) -> MatchResult<'_> {
        if points.len() < 2 {
            debug!("recognize: query has {} points, need at least 2", points.len());
            return MatchResult::none();
        }
        if self.store.is_empty() {
            debug!("recognize: template store is empty");
            return MatchResult::none();
        }

        let query = normalize(points, &self.config);
        let angle_range: f32 = Angle::degrees(self.config.angle_range).get();
        let angle_precision: f32 = Angle::degrees(self.config.angle_precision).get();

        let mut best: Option<&Template> = None;
        let mut best_distance = f32::MAX;
        for template in self.store.iter() {
            let distance = query.distance_at_best_angle(
                &template.path,
                -angle_range,
                angle_range,
                angle_precision,
            );
            trace!("recognize: {:?} at distance {}", template.name, distance);
            if distance < best_distance {
                best_distance = distance;
                best = Some(template);
            }
        }

        match best {
            Some(template) => {
                let score = 1.0 - best_distance / self.config.half_diagonal();
                debug!("recognize: matched {:?} with score {}", template.name, score);
                MatchResult {
                    template: Some(template),
                    score,
                }
            }
            None => MatchResult::none(),
        }
    }
}
