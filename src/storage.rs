//! JSON export/import of the tank population. The wire shape is the
//! original aquarium schema: camelCase keys, colors as `#RRGGBB` strings,
//! only the fields listed here — everything else regenerates on import.

use crate::aquarium::Aquarium;
use crate::entity::{Size, Vec2, TANK_HEIGHT, TANK_WIDTH};
use crate::fish::{Appendages, FishShape, Pattern};
use crate::color::Rgb;
use crate::generators::{FishOptions, PlantOptions};
use crate::plant::{PlantShape, Segment};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishRecord {
    pub base_shape: FishShape,
    pub colors: Vec<Rgb>,
    pub appendages: Appendages,
    pub patterns: Vec<Pattern>,
    pub size: Size,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRecord {
    pub base_shape: PlantShape,
    pub colors: Vec<Rgb>,
    pub segments: Vec<Segment>,
    pub position: Vec2,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TankExport {
    pub fish: Vec<FishRecord>,
    pub plants: Vec<PlantRecord>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub fish: usize,
    pub plants: usize,
    /// Fields dropped during validation and regenerated instead.
    pub regenerated_fields: usize,
}

pub fn export(aq: &Aquarium) -> TankExport {
    TankExport {
        fish: aq
            .fish()
            .into_iter()
            .map(|f| FishRecord {
                base_shape: f.base_shape,
                colors: f.colors,
                appendages: f.appendages,
                patterns: f.patterns,
                size: f.body.size,
            })
            .collect(),
        plants: aq
            .plants()
            .into_iter()
            .map(|p| PlantRecord {
                base_shape: p.base_shape,
                colors: p.colors,
                segments: p.segments,
                position: p.body.pos,
            })
            .collect(),
    }
}

pub fn export_json(aq: &Aquarium) -> Result<String> {
    serde_json::to_string_pretty(&export(aq)).context("serializing tank export")
}

/// Atomic write: serialize to a temp file, then rename over the target.
pub fn export_to_path(aq: &Aquarium, path: &Path) -> Result<()> {
    let data = export_json(aq)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

pub fn parse_import(json: &str) -> Result<TankExport> {
    serde_json::from_str(json).context("parsing aquarium import")
}

pub fn import_from_path(path: &Path) -> Result<TankExport> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_import(&text)
}

/// Apply a parsed import. Every record is validated field by field:
/// a field that fails validation is dropped (and regenerated by the
/// generator) rather than producing an entity with undefined physics.
/// The tank is only touched after every entity has been built.
pub fn apply_import(aq: &mut Aquarium, data: TankExport) -> ImportSummary {
    let mut summary = ImportSummary::default();

    let mut fish = Vec::with_capacity(data.fish.len());
    for record in data.fish {
        let opts = fish_options(record, &mut summary.regenerated_fields);
        fish.push(aq.import_fish(opts));
    }

    let mut plants = Vec::with_capacity(data.plants.len());
    for record in data.plants {
        let opts = plant_options(record, &mut summary.regenerated_fields);
        plants.push(aq.import_plant(opts));
    }

    summary.fish = fish.len();
    summary.plants = plants.len();
    aq.replace_entities(fish, plants);
    summary
}

fn valid_size(s: &Size) -> bool {
    s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0
}

fn valid_position(p: &Vec2) -> bool {
    p.x.is_finite()
        && p.y.is_finite()
        && (0.0..=TANK_WIDTH).contains(&p.x)
        && (0.0..=TANK_HEIGHT).contains(&p.y)
}

fn valid_appendages(a: &Appendages) -> bool {
    let tail_ok = a.tail.as_ref().map_or(true, |t| valid_size(&t.size));
    let fins_ok = a
        .fins
        .iter()
        .all(|f| valid_size(&f.size) && f.position.x.is_finite() && f.position.y.is_finite());
    let eyes_ok = a
        .eyes
        .iter()
        .all(|e| e.size.is_finite() && e.size >= 0.0 && e.position.x.is_finite() && e.position.y.is_finite());
    tail_ok && fins_ok && eyes_ok && a.eyes.len() <= 3
}

fn valid_patterns(patterns: &[Pattern]) -> bool {
    patterns.iter().all(|p| match p {
        Pattern::Spots { spots, .. } => spots
            .iter()
            .all(|s| s.x.is_finite() && s.y.is_finite() && s.size.is_finite() && s.size >= 0.0),
        Pattern::Stripes { stripes, .. } => stripes.iter().all(|s| {
            s.x.is_finite()
                && s.y.is_finite()
                && s.width.is_finite()
                && s.height.is_finite()
                && s.width >= 0.0
                && s.height >= 0.0
        }),
    })
}

fn valid_segments(segments: &[Segment]) -> bool {
    segments.iter().all(|s| {
        valid_size(&s.size)
            && s.position.x.is_finite()
            && s.position.y.is_finite()
            && s.rotation.is_finite()
    })
}

fn fish_options(record: FishRecord, regenerated: &mut usize) -> FishOptions {
    let mut opts = FishOptions {
        base_shape: Some(record.base_shape),
        ..FishOptions::default()
    };

    if valid_size(&record.size) {
        opts.size = Some(record.size);
    } else {
        *regenerated += 1;
    }
    if record.colors.is_empty() {
        *regenerated += 1;
    } else {
        opts.colors = Some(record.colors);
    }
    if valid_appendages(&record.appendages) {
        opts.appendages = Some(record.appendages);
    } else {
        *regenerated += 1;
    }
    if valid_patterns(&record.patterns) {
        opts.patterns = Some(record.patterns);
    } else {
        *regenerated += 1;
    }
    opts
}

fn plant_options(record: PlantRecord, regenerated: &mut usize) -> PlantOptions {
    let mut opts = PlantOptions {
        base_shape: Some(record.base_shape),
        ..PlantOptions::default()
    };

    if record.colors.is_empty() {
        *regenerated += 1;
    } else {
        opts.colors = Some(record.colors);
    }
    if valid_segments(&record.segments) && !record.segments.is_empty() {
        opts.segments = Some(record.segments);
    } else {
        *regenerated += 1;
    }
    if valid_position(&record.position) {
        opts.position = Some(record.position);
    } else {
        *regenerated += 1;
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{FishOptions, PlantOptions};

    #[test]
    fn export_schema_uses_camel_case_and_hex_colors() {
        let mut aq = Aquarium::new(1);
        aq.spawn_fish(FishOptions::default());
        aq.spawn_plant(PlantOptions::default());

        let json = export_json(&aq).unwrap();
        assert!(json.contains("\"baseShape\""));
        assert!(json.contains("\"appendages\""));
        assert!(json.contains("\"#"));
        // No runtime-only fields leak into the wire format.
        assert!(!json.contains("dir_timer"));
        assert!(!json.contains("velocity"));
    }

    #[test]
    fn malformed_json_fails_without_touching_state() {
        let mut aq = Aquarium::new(2);
        aq.spawn_fish(FishOptions::default());
        let before = aq.counts();

        assert!(parse_import("{ not json").is_err());
        assert!(parse_import("{\"fish\": 12}").is_err());
        assert_eq!(aq.counts(), before);
    }

    #[test]
    fn corrupt_fields_are_regenerated_not_imported() {
        let mut aq = Aquarium::new(3);
        let data = TankExport {
            fish: vec![FishRecord {
                base_shape: FishShape::Oval,
                colors: vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)],
                appendages: Appendages::default(),
                patterns: Vec::new(),
                size: Size::new(-40.0, 0.0),
            }],
            plants: Vec::new(),
        };

        let summary = apply_import(&mut aq, data);
        assert_eq!(summary.fish, 1);
        assert_eq!(summary.regenerated_fields, 1);

        let fish = aq.fish();
        assert_eq!(fish[0].colors, vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]);
        // The bogus size was replaced by a sane generated one.
        assert!(fish[0].body.size.width > 0.0 && fish[0].body.size.height > 0.0);
    }

    #[test]
    fn round_trip_preserves_exported_fields() {
        let mut aq = Aquarium::new(4);
        for _ in 0..6 {
            aq.spawn_fish(FishOptions::default());
        }
        for _ in 0..3 {
            aq.spawn_plant(PlantOptions::default());
        }

        let json = export_json(&aq).unwrap();
        let parsed = parse_import(&json).unwrap();

        let mut restored = Aquarium::new(99);
        let summary = apply_import(&mut restored, parsed);
        assert_eq!(summary.fish, 6);
        assert_eq!(summary.plants, 3);
        assert_eq!(summary.regenerated_fields, 0);

        let (a_fish, b_fish) = (aq.fish(), restored.fish());
        for (a, b) in a_fish.iter().zip(b_fish.iter()) {
            assert_eq!(a.base_shape, b.base_shape);
            assert_eq!(a.colors, b.colors);
            assert_eq!(a.appendages.fins.len(), b.appendages.fins.len());
            assert_eq!(a.appendages.eyes.len(), b.appendages.eyes.len());
            assert_eq!(a.patterns.len(), b.patterns.len());
            assert_eq!(a.body.size, b.body.size);
        }

        let (a_plants, b_plants) = (aq.plants(), restored.plants());
        for (a, b) in a_plants.iter().zip(b_plants.iter()) {
            assert_eq!(a.base_shape, b.base_shape);
            assert_eq!(a.colors, b.colors);
            assert_eq!(a.segments.len(), b.segments.len());
            assert_eq!(a.body.pos, b.body.pos);
        }
    }
}
