//! Version registry for shape layouts
//!
//! Every table whose record layout changed between revisions has its own
//! registry of `(versions, format)` rows. Supporting a new revision means
//! adding rows here plus the reader for any new record layout.

use std::ops::RangeInclusive;

use super::records::{
    self, RawDetail, RawKeyframe, RawNode, RawObject, RawSequence, RawSubSequence, RawTransition,
    RawTrigger,
};
use crate::binary::ByteCursor;
use crate::error::{Error, Result};
use crate::shape::types::Transform;

/// Oldest and newest shape revisions with registered layouts.
pub const SUPPORTED_VERSIONS: RangeInclusive<u32> = 1..=8;

/// A record reader and the number of bytes it consumes.
pub(crate) struct RecordFormat<T> {
    pub size: usize,
    pub read: fn(&mut ByteCursor<'_>) -> Result<T>,
}

impl<T> Clone for RecordFormat<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RecordFormat<T> {}

impl<T> RecordFormat<T> {
    const fn new(size: usize, read: fn(&mut ByteCursor<'_>) -> Result<T>) -> Self {
        Self { size, read }
    }

    /// Read `count` records after checking the whole table fits.
    pub fn read_table(&self, cursor: &mut ByteCursor<'_>, count: u32) -> Result<Vec<T>> {
        cursor.ensure_u64(u64::from(count) * self.size as u64)?;
        (0..count).map(|_| (self.read)(cursor)).collect()
    }
}

type Registry<T> = &'static [(RangeInclusive<u32>, RecordFormat<T>)];

static NODES: Registry<RawNode> = &[
    (1..=7, RecordFormat::new(20, records::node_wide)),
    (8..=8, RecordFormat::new(10, records::node_compact)),
];

static SEQUENCES: Registry<RawSequence> = &[
    (1..=3, RecordFormat::new(16, records::sequence_basic)),
    (4..=4, RecordFormat::new(24, records::sequence_with_triggers)),
    (5..=8, RecordFormat::new(32, records::sequence_with_ifl)),
];

static SUBSEQUENCES: Registry<RawSubSequence> = &[
    (1..=7, RecordFormat::new(12, records::subsequence_wide)),
    (8..=8, RecordFormat::new(6, records::subsequence_compact)),
];

static KEYFRAMES: Registry<RawKeyframe> = &[
    (1..=2, RecordFormat::new(8, records::keyframe_packed)),
    (3..=7, RecordFormat::new(12, records::keyframe_wide)),
    (8..=8, RecordFormat::new(8, records::keyframe_compact)),
];

static TRANSFORMS: Registry<Transform> = &[
    (1..=6, RecordFormat::new(40, records::transform_float)),
    (7..=7, RecordFormat::new(32, records::transform_quat16_scaled)),
    (8..=8, RecordFormat::new(20, records::transform_quat16)),
];

static OBJECTS: Registry<RawObject> = &[
    (1..=7, RecordFormat::new(72, records::object_wide)),
    (8..=8, RecordFormat::new(28, records::object_compact)),
];

static DETAILS: Registry<RawDetail> = &[(1..=8, RecordFormat::new(8, records::detail))];

static TRANSITIONS: Registry<RawTransition> = &[
    (2..=6, RecordFormat::new(60, records::transition_float)),
    (7..=7, RecordFormat::new(52, records::transition_quat16_scaled)),
    (8..=8, RecordFormat::new(40, records::transition_quat16)),
];

static TRIGGERS: Registry<RawTrigger> = &[(4..=8, RecordFormat::new(8, records::trigger))];

/// Byte width of one stored object name.
pub(crate) const NAME_SIZE: usize = 24;

// Header fields and trailing sections introduced after the first revision
const TRANSITIONS_SINCE: u32 = 2;
const TRIGGERS_SINCE: u32 = 4;
const DEFAULT_MATERIALS_SINCE: u32 = 5;
const ALWAYS_NODE_SINCE: u32 = 6;
const BOUNDS_SINCE: u32 = 8;

fn lookup<T>(registry: Registry<T>, version: u32) -> Option<RecordFormat<T>> {
    registry
        .iter()
        .find(|(versions, _)| versions.contains(&version))
        .map(|(_, format)| *format)
}

/// Everything version-dependent about one shape revision.
#[derive(Clone, Copy)]
pub(crate) struct ShapeLayout {
    pub version: u32,
    pub node: RecordFormat<RawNode>,
    pub sequence: RecordFormat<RawSequence>,
    pub subsequence: RecordFormat<RawSubSequence>,
    pub keyframe: RecordFormat<RawKeyframe>,
    pub transform: RecordFormat<Transform>,
    pub object: RecordFormat<RawObject>,
    pub detail: RecordFormat<RawDetail>,
    pub transition: Option<RecordFormat<RawTransition>>,
    pub trigger: Option<RecordFormat<RawTrigger>>,
}

impl ShapeLayout {
    /// Assemble the layout for `version` from the registries.
    pub fn for_version(version: u32) -> Result<Self> {
        let unsupported = || Error::UnsupportedVersion {
            format: "shape",
            version,
        };
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(unsupported());
        }
        Ok(Self {
            version,
            node: lookup(NODES, version).ok_or_else(unsupported)?,
            sequence: lookup(SEQUENCES, version).ok_or_else(unsupported)?,
            subsequence: lookup(SUBSEQUENCES, version).ok_or_else(unsupported)?,
            keyframe: lookup(KEYFRAMES, version).ok_or_else(unsupported)?,
            transform: lookup(TRANSFORMS, version).ok_or_else(unsupported)?,
            object: lookup(OBJECTS, version).ok_or_else(unsupported)?,
            detail: lookup(DETAILS, version).ok_or_else(unsupported)?,
            transition: lookup(TRANSITIONS, version),
            trigger: lookup(TRIGGERS, version),
        })
    }

    pub fn has_transitions(&self) -> bool {
        self.version >= TRANSITIONS_SINCE
    }

    pub fn has_triggers(&self) -> bool {
        self.version >= TRIGGERS_SINCE
    }

    pub fn has_default_materials(&self) -> bool {
        self.version >= DEFAULT_MATERIALS_SINCE
    }

    pub fn has_always_node(&self) -> bool {
        self.version >= ALWAYS_NODE_SINCE
    }

    pub fn has_bounds(&self) -> bool {
        self.version >= BOUNDS_SINCE
    }
}
