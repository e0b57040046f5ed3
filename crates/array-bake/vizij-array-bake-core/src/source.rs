//! Host-neutral description of the object being realized and the precondition
//! checks that must pass before the host duplicates or deletes anything.

use serde::{Deserialize, Serialize};

use crate::config::{validate_count, BakeConfig};
use crate::error::BakeError;
use crate::math::FrameRange;
use crate::rotation::RotationPolicy;

/// Procedural generator attached to a source object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Generator {
    Array(ArrayGenerator),
    /// Any other modifier; ignored by the planner.
    Other { kind: String },
}

/// Array generator settings as read from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayGenerator {
    pub count: i64,
    #[serde(default)]
    pub offset_object: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceObject {
    pub name: String,
    #[serde(default)]
    pub generators: Vec<Generator>,
}

impl SourceObject {
    /// First array generator in stack order.
    pub fn array_generator(&self) -> Option<&ArrayGenerator> {
        self.generators.iter().find_map(|g| match g {
            Generator::Array(a) => Some(a),
            Generator::Other { .. } => None,
        })
    }
}

/// Everything the host needs to run a bake and then realize its instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BakePlan {
    pub source: String,
    pub offset_object: String,
    pub count: usize,
    pub range: FrameRange,
}

impl BakePlan {
    pub fn config(&self, rotation: RotationPolicy) -> BakeConfig {
        BakeConfig {
            frame_start: self.range.start,
            frame_end: self.range.end,
            count: self.count as i64,
            rotation,
            ..Default::default()
        }
    }
}

/// Check every precondition in order: source, array generator, count,
/// offset object, frame range.
pub fn plan_bake(source: Option<&SourceObject>, range: FrameRange) -> Result<BakePlan, BakeError> {
    let source = source.ok_or(BakeError::MissingSource)?;
    let array = source
        .array_generator()
        .ok_or_else(|| BakeError::MissingGenerator {
            object: source.name.clone(),
        })?;
    let count = validate_count(array.count)?;
    let offset_object = array
        .offset_object
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BakeError::MissingOffset {
            object: source.name.clone(),
        })?;
    range.validate()?;

    Ok(BakePlan {
        source: source.name.clone(),
        offset_object,
        count,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(generators: Vec<Generator>) -> SourceObject {
        SourceObject {
            name: "Cube".into(),
            generators,
        }
    }

    fn array(count: i64, offset: Option<&str>) -> Generator {
        Generator::Array(ArrayGenerator {
            count,
            offset_object: offset.map(str::to_string),
        })
    }

    const RANGE: FrameRange = FrameRange { start: 1, end: 10 };

    #[test]
    fn missing_source() {
        assert_eq!(plan_bake(None, RANGE), Err(BakeError::MissingSource));
    }

    #[test]
    fn missing_generator_ignores_other_modifiers() {
        let src = cube(vec![Generator::Other {
            kind: "BEVEL".into(),
        }]);
        assert_eq!(
            plan_bake(Some(&src), RANGE),
            Err(BakeError::MissingGenerator {
                object: "Cube".into()
            })
        );
    }

    #[test]
    fn count_checked_before_offset() {
        let src = cube(vec![array(0, None)]);
        assert_eq!(
            plan_bake(Some(&src), RANGE),
            Err(BakeError::InvalidCount { count: 0 })
        );
        let src = cube(vec![array(3, None)]);
        assert_eq!(
            plan_bake(Some(&src), RANGE),
            Err(BakeError::MissingOffset {
                object: "Cube".into()
            })
        );
    }

    #[test]
    fn range_checked_last() {
        let src = cube(vec![array(3, Some("Empty"))]);
        assert_eq!(
            plan_bake(Some(&src), FrameRange { start: 9, end: 2 }),
            Err(BakeError::EmptyRange { start: 9, end: 2 })
        );
    }

    #[test]
    fn first_array_wins() {
        let src = cube(vec![
            Generator::Other {
                kind: "SUBSURF".into(),
            },
            array(4, Some("Empty")),
            array(9, Some("Other")),
        ]);
        let plan = plan_bake(Some(&src), RANGE).unwrap();
        assert_eq!(plan.count, 4);
        assert_eq!(plan.offset_object, "Empty");
        assert_eq!(plan.config(RotationPolicy::Euler).count, 4);
    }

    #[test]
    fn parses_host_json() {
        let src: SourceObject = serde_json::from_str(
            r#"{
                "name": "Tile",
                "generators": [
                    { "type": "other", "kind": "SOLIDIFY" },
                    { "type": "array", "count": 5, "offset_object": "Driver" }
                ]
            }"#,
        )
        .unwrap();
        let plan = plan_bake(Some(&src), RANGE).unwrap();
        assert_eq!(plan.source, "Tile");
        assert_eq!(plan.count, 5);
    }
}
