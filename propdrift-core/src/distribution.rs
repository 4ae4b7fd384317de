//! Property distributions: one property vector per sampled frame

use crate::{Frame, Property, PropertyVector, Result, SampledFrame};
use std::collections::HashMap;
use std::path::PathBuf;

/// A frame handed to the distribution builder
#[derive(Debug, Clone)]
pub enum FrameInput {
    /// An already decoded frame
    Frame(Frame),
    /// An image file to be loaded first
    Path(PathBuf),
}

impl FrameInput {
    /// Loads the frame if needed and returns its identifier
    fn load(self, position: usize) -> (String, Result<Frame>) {
        match self {
            FrameInput::Frame(frame) => (format!("image_{}", position), Ok(frame)),
            FrameInput::Path(path) => {
                let id = path.display().to_string();
                (id, Frame::open(&path))
            }
        }
    }
}

impl From<Frame> for FrameInput {
    fn from(frame: Frame) -> Self {
        FrameInput::Frame(frame)
    }
}

impl From<SampledFrame> for FrameInput {
    fn from(sampled: SampledFrame) -> Self {
        FrameInput::Frame(sampled.frame)
    }
}

impl From<PathBuf> for FrameInput {
    fn from(path: PathBuf) -> Self {
        FrameInput::Path(path)
    }
}

/// Lazily extracts a property vector from every input.
///
/// Inputs that fail to load or to extract are skipped; they still consume
/// a position, so generated identifiers follow the input order.
pub fn extract_properties<I>(inputs: I) -> impl Iterator<Item = (String, PropertyVector)>
where
    I: IntoIterator,
    I::Item: Into<FrameInput>,
{
    inputs
        .into_iter()
        .enumerate()
        .filter_map(|(position, input)| {
            let input: FrameInput = input.into();
            let (id, frame) = input.load(position);
            match frame.and_then(|frame| PropertyVector::extract(&frame)) {
                Ok(vector) => Some((id, vector)),
                Err(e) => {
                    log::debug!("Skipping frame {}: {}", id, e);
                    None
                }
            }
        })
}

/// Frame identifier to property vector, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDistribution {
    entries: Vec<(String, PropertyVector)>,
    index: HashMap<String, usize>,
}

impl PropertyDistribution {
    /// Creates an empty distribution
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a distribution from a sequence of frame inputs
    pub fn from_frames<I>(inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FrameInput>,
    {
        extract_properties(inputs).collect()
    }

    /// Inserts a vector; an existing identifier keeps its position and gets the new vector
    pub fn insert(&mut self, id: impl Into<String>, vector: PropertyVector) {
        let id = id.into();
        match self.index.get(&id) {
            Some(&slot) => self.entries[slot].1 = vector,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, vector));
            }
        }
    }

    /// Gets the vector of one frame
    pub fn get(&self, id: &str) -> Option<&PropertyVector> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    /// Number of frames in the distribution
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no frame was extracted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(frame id, vector)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyVector)> {
        self.entries.iter().map(|(id, vector)| (id.as_str(), vector))
    }

    /// All values of one property, in insertion order
    pub fn values(&self, property: Property) -> Vec<f64> {
        self.entries.iter().map(|(_, vector)| vector.get(property)).collect()
    }
}

impl FromIterator<(String, PropertyVector)> for PropertyDistribution {
    fn from_iter<T: IntoIterator<Item = (String, PropertyVector)>>(iter: T) -> Self {
        let mut distribution = Self::new();
        for (id, vector) in iter {
            distribution.insert(id, vector);
        }
        distribution
    }
}
