//! Layout resolution tests: defaults, stored calibration, inheritance and
//! the label / pitch text a renderer ends up drawing.

use pretty_assertions::assert_eq;
use serde_json::json;
use tonefield::{
    ellipse_bottom_point, render_layout, CalibrationStore, EngineConfig, ExceptionTable,
    LayoutResolver, LayoutSource, MemoryStore, Override, Position, Scale, StorageKey,
    TemplateKey, TemplateRegistry,
};

fn d_kurd_9() -> Scale {
    Scale::new("d_kurd_9", "D3", &["A3", "Bb3", "C4", "D4", "E4", "F4", "G4", "A4"], &[])
}

fn e_equinox_14() -> Scale {
    Scale::new(
        "e_equinox_14",
        "E3",
        &["G3", "B3", "C4", "D4", "E4", "F#4", "G4", "B4", "C5"],
        &["C3", "D3", "D5", "E5"],
    )
}

fn fs_low_pygmy_18() -> Scale {
    Scale::new(
        "fs_low_pygmy_18_mutant",
        "F#3",
        &["G#3", "A3", "D4", "E4", "F#4", "G#4", "A4", "D5", "E5", "F#5", "G#5"],
        &["D3", "E3", "B3", "C#4", "B4", "C#5"],
    )
}

struct Fixture {
    registry: TemplateRegistry,
    exceptions: ExceptionTable,
    config: EngineConfig,
    store: MemoryStore,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            registry: TemplateRegistry::new(),
            exceptions: ExceptionTable::builtin(),
            config: EngineConfig::default(),
            store: MemoryStore::new(),
        }
    }

    fn resolver(&self) -> LayoutResolver<'_, MemoryStore> {
        LayoutResolver::new(&self.registry, &self.exceptions, &self.store, &self.config)
    }

    fn store_json(&mut self, key: String, value: serde_json::Value) {
        self.store.save(&key, &value).unwrap();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Default and stored layouts
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn empty_store_resolves_to_template_defaults() {
    let fx = Fixture::new();
    let resolved = fx.resolver().resolve(TemplateKey::Notes10, None);
    assert_eq!(resolved.source, LayoutSource::Defaults);
    assert_eq!(resolved.storage_key.suffix(), "10");
    assert_eq!(resolved.notes, fx.registry.defaults(TemplateKey::Notes10, None));
    println!("✓ 10-note defaults: {} fields", resolved.notes.len());
}

#[test]
fn stored_geometry_wins_and_positions_are_inferred() {
    let mut fx = Fixture::new();
    let key = StorageKey::for_scale("d_kurd_9");
    fx.store_json(
        key.tone_field_key(&fx.config),
        json!([
            {"id":0,"label":"D","cx":510,"cy":495,"scale":380,"rotate":88},
            {"id":1,"label":"1","cx":650,"cy":770,"scale":280,"rotate":120}
        ]),
    );
    let resolved = fx.resolver().resolve(TemplateKey::Notes9, Some(&d_kurd_9()));
    assert_eq!(resolved.source, LayoutSource::Stored);
    assert_eq!(resolved.notes.len(), 2);
    assert_eq!(resolved.notes[0].position, Position::Center);
    assert_eq!(resolved.notes[0].cx, 510.0);
    // Seeded from the 9-note default label anchors.
    assert_eq!(resolved.notes[1].overrides.label_y, Override::Value(886.0));
}

#[test]
fn null_label_override_forces_computed_anchor() {
    let mut fx = Fixture::new();
    let key = StorageKey::for_template(TemplateKey::Notes9);
    let tone: Vec<_> = fx
        .registry
        .defaults(TemplateKey::Notes9, None)
        .iter()
        .map(|n| n.tone_field_record())
        .collect();
    fx.store_json(key.tone_field_key(&fx.config), serde_json::to_value(&tone).unwrap());
    fx.store_json(key.label_key(&fx.config), json!([{"id":1,"label":"1","labelY":null}]));

    let resolved = fx.resolver().resolve(TemplateKey::Notes9, None);
    let n1 = resolved.notes.iter().find(|n| n.id == 1).unwrap();
    assert_eq!(n1.overrides.label_y, Override::Auto);

    let model = render_layout(&resolved.notes, TemplateKey::Notes9, None, &fx.exceptions, &fx.config);
    let drawn = model.notes.iter().find(|n| n.id == 1).unwrap();
    let bottom = ellipse_bottom_point(n1.cx, n1.cy, n1.rx(), n1.ry(), n1.rotate);
    let label = drawn.label.as_ref().unwrap();
    assert!((label.at.y - (bottom.y + 25.0)).abs() < 1e-9);
    assert!((label.at.y - 886.0).abs() > 1.0);
}

#[test]
fn duplicate_stored_ids_keep_first() {
    let mut fx = Fixture::new();
    let key = StorageKey::for_template(TemplateKey::Notes14M);
    fx.store_json(
        key.tone_field_key(&fx.config),
        json!([
            {"id":0,"label":"3","cx":500,"cy":500,"scale":389.7,"rotate":90},
            {"id":12,"label":"13","cx":100,"cy":100,"scale":200,"rotate":0},
            {"id":12,"label":"13","cx":900,"cy":900,"scale":200,"rotate":0}
        ]),
    );
    let resolved = fx.resolver().resolve(TemplateKey::Notes14M, None);
    assert_eq!(resolved.notes.len(), 2);
    assert_eq!(resolved.notes[1].cx, 100.0);
}

// ═══════════════════════════════════════════════════════════════════════
// Inheritance
// ═══════════════════════════════════════════════════════════════════════

fn seed_inheritance_source(fx: &mut Fixture) {
    let key = StorageKey::for_scale("fs_low_pygmy_14_mutant");
    let notes = fx.registry.defaults(TemplateKey::Notes14M, None);
    let tone: Vec<_> = notes.iter().map(|n| n.tone_field_record()).collect();
    let labels: Vec<_> = notes.iter().map(|n| n.label_record()).collect();
    fx.store_json(key.tone_field_key(&fx.config), serde_json::to_value(&tone).unwrap());
    fx.store_json(key.label_key(&fx.config), serde_json::to_value(&labels).unwrap());
}

#[test]
fn eighteen_note_scale_inherits_and_ranks_fields() {
    let mut fx = Fixture::new();
    seed_inheritance_source(&mut fx);
    let scale = fs_low_pygmy_18();
    let resolved = fx.resolver().resolve(TemplateKey::Notes14M, Some(&scale));
    assert_eq!(resolved.source, LayoutSource::Inherited);
    assert_eq!(resolved.notes.len(), 18);
    assert_eq!(resolved.notes.iter().find(|n| n.id == 16).unwrap().position, Position::Top);
    assert_eq!(resolved.notes.iter().find(|n| n.id == 14).unwrap().position, Position::Bottom);

    let model = render_layout(&resolved.notes, TemplateKey::Notes14M, Some(&scale), &fx.exceptions, &fx.config);
    let pitch = |id: u32| {
        model
            .notes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.pitch.as_ref())
            .map(|p| p.text.clone())
    };
    assert_eq!(pitch(0).as_deref(), Some("F#3"));
    assert_eq!(pitch(1).as_deref(), Some("G#3"));
    assert_eq!(pitch(12).as_deref(), Some("B3"));
    assert_eq!(pitch(13).as_deref(), Some("C#4"));
    assert_eq!(pitch(17).as_deref(), Some("G#5"));
    println!("✓ fs_low_pygmy_18_mutant inherits 18 fields");
}

#[test]
fn own_labels_gain_anchors_for_appended_fields() {
    let mut fx = Fixture::new();
    seed_inheritance_source(&mut fx);
    let scale = fs_low_pygmy_18();
    fx.store_json(
        StorageKey::for_scale(&scale.id).label_key(&fx.config),
        json!([{"id":1,"label":"4","labelX":640,"labelY":900}]),
    );
    let resolved = fx.resolver().resolve(TemplateKey::Notes14M, Some(&scale));
    assert_eq!(resolved.source, LayoutSource::Inherited);
    let n1 = resolved.notes.iter().find(|n| n.id == 1).unwrap();
    assert_eq!(n1.overrides.label_y, Override::Value(900.0));
    for id in 14..18 {
        let note = resolved.notes.iter().find(|n| n.id == id).unwrap();
        assert!(matches!(note.overrides.label_y, Override::Value(_)), "id {id} has no label anchor");
    }
    // Source-only ids are not pulled in from the borrowed labels.
    let n2 = resolved.notes.iter().find(|n| n.id == 2).unwrap();
    let defaults = fx.registry.defaults(TemplateKey::Notes14M, None);
    let seed = defaults.iter().find(|n| n.id == 2).unwrap();
    assert_eq!(n2.overrides.label_y, seed.overrides.label_y);
}

#[test]
fn relabelled_ding_keeps_ding_pitch() {
    let mut fx = Fixture::new();
    let scale = fs_low_pygmy_18();
    fx.store_json(
        StorageKey::for_scale(&scale.id).tone_field_key(&fx.config),
        json!([
            {"id":0,"label":"1","cx":500,"cy":500,"scale":389.7,"rotate":90},
            {"id":1,"label":"4","cx":661,"cy":779,"scale":286,"rotate":121}
        ]),
    );
    let resolved = fx.resolver().resolve(TemplateKey::Notes14M, Some(&scale));
    assert_eq!(resolved.source, LayoutSource::Stored);
    let model = render_layout(&resolved.notes, TemplateKey::Notes14M, Some(&scale), &fx.exceptions, &fx.config);
    let ding = model.notes.iter().find(|n| n.id == 0).unwrap();
    assert_eq!(ding.pitch.as_ref().map(|p| p.text.as_str()), Some("F#3"));
}

#[test]
fn stored_data_suppresses_inheritance() {
    let mut fx = Fixture::new();
    seed_inheritance_source(&mut fx);
    let own = StorageKey::for_template(TemplateKey::Notes15);
    fx.store_json(
        own.tone_field_key(&fx.config),
        json!([{"id":0,"label":"1","cx":500,"cy":500,"scale":389.7,"rotate":90}]),
    );
    let resolved = fx.resolver().resolve(TemplateKey::Notes15, None);
    assert_eq!(resolved.source, LayoutSource::Stored);
    assert_eq!(resolved.notes.len(), 1);
}

#[test]
fn fifteen_without_source_falls_back_to_defaults() {
    let fx = Fixture::new();
    let resolved = fx.resolver().resolve(TemplateKey::Notes15, None);
    assert_eq!(resolved.source, LayoutSource::Defaults);
    assert_eq!(resolved.notes.len(), 9);
}

// ═══════════════════════════════════════════════════════════════════════
// End to end
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn twelve_n_preview_labels() {
    let fx = Fixture::new();
    let resolved = fx.resolver().resolve(TemplateKey::Notes12N, None);
    let model = render_layout(&resolved.notes, TemplateKey::Notes12N, None, &fx.exceptions, &fx.config);
    let label = |id: u32| {
        model
            .notes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.label.as_ref())
            .map(|l| l.text.clone())
            .unwrap_or_default()
    };
    assert_eq!(label(10), "1");
    assert_eq!(label(11), "2");
    assert_eq!(label(0), "3");
    assert_eq!(label(5), "8");
    assert!(model.placeholder.is_none());

    let pitch = |id: u32| model.notes.iter().find(|n| n.id == id).and_then(|n| n.pitch.clone()).map(|p| p.text);
    assert_eq!(pitch(5).as_deref(), Some("E"));
    assert_eq!(pitch(10), None);
    assert_eq!(pitch(11), None);
    let ids: Vec<u32> = resolved.notes.iter().map(|n| n.id).collect();
    assert_eq!(ids, (0..=11).collect::<Vec<_>>());
}

#[test]
fn d_kurd_9_pitches_follow_sorted_top_notes() {
    let fx = Fixture::new();
    let scale = d_kurd_9();
    let template = TemplateKey::natural_for(&scale);
    assert_eq!(template, TemplateKey::Notes9);

    let resolved = fx.resolver().resolve(template, Some(&scale));
    let model = render_layout(&resolved.notes, template, Some(&scale), &fx.exceptions, &fx.config);
    let pitches: Vec<String> = model
        .notes
        .iter()
        .map(|n| n.pitch.as_ref().map(|p| p.text.clone()).unwrap_or_default())
        .collect();
    assert_eq!(
        pitches,
        vec!["D3", "A3", "Bb3", "C4", "D4", "E4", "F4", "G4", "A4"]
    );
    assert_eq!(model.notes[0].pitch.as_ref().unwrap().size, 37.0);
    assert_eq!(model.notes[0].symbols.len(), 3);
    println!("✓ d_kurd_9 resolved on its natural template");
}

#[test]
fn e_equinox_14_uses_its_layout_variant_and_bottom_pitches() {
    let fx = Fixture::new();
    let scale = e_equinox_14();
    let resolved = fx.resolver().resolve(TemplateKey::Notes14N, Some(&scale));
    let n12 = resolved.notes.iter().find(|n| n.id == 12).unwrap();
    assert_eq!((n12.cx, n12.cy), (420.0, 120.0));

    let model = render_layout(&resolved.notes, TemplateKey::Notes14N, Some(&scale), &fx.exceptions, &fx.config);
    let pitch = |id: u32| model.notes.iter().find(|n| n.id == id).unwrap().pitch.clone().unwrap().text;
    assert_eq!(pitch(10), "C3");
    assert_eq!(pitch(11), "D3");
    assert_eq!(pitch(12), "D5");
    assert_eq!(pitch(13), "E5");
}

#[test]
fn incompatible_scale_shows_placeholder() {
    let fx = Fixture::new();
    let scale = Scale::new("odd_11", "D3", &["A3", "C4", "D4", "E4", "F4", "G4", "A4"], &["C3", "E3", "F3"]);
    let resolved = fx.resolver().resolve(TemplateKey::Notes11, Some(&scale));
    let model = render_layout(&resolved.notes, TemplateKey::Notes11, Some(&scale), &fx.exceptions, &fx.config);
    assert_eq!(model.placeholder.as_deref(), Some("Not implemented"));
    assert!(model.notes.iter().all(|n| n.pitch.is_none()));
}
