use approx::assert_relative_eq;
use config::constants::TranslationConfig;
use glam::DVec3;
use hdds_compose::{
    translate, translate_document, DivisionAxis, Event, EventLog, IdentifierList, ReferenceFrame,
    TranslateError,
};
use hdds_document::Document;
use std::f64::consts::PI;

const MATERIALS: &str = r#"
  <element name="Air" z="7.3" a="14.6"><real name="density" value="0.0012"/></element>
  <element name="Iron" z="26" a="55.85"><real name="density" value="7.87"/></element>
"#;

fn document(body: &str) -> Document {
    Document::parse_str(&format!("<HDDS>{MATERIALS}{body}</HDDS>")).unwrap()
}

fn run(doc: &mut Document) -> Result<EventLog, TranslateError> {
    let mut log = EventLog::new();
    let root = doc.lookup("everything").unwrap();
    translate(doc, root, &mut log)?;
    Ok(log)
}

fn ring(command: &str) -> Document {
    document(&format!(
        r#"<box name="HALL" X_Y_Z="500 500 500" material="Air"/>
           <tubs name="RING" Rio_Z="10 20 5" material="Air"/>
           <box name="CELL" X_Y_Z="1 1 1" material="Iron"/>
           <composition name="everything" envelope="HALL">
             <posXYZ volume="ring"/>
           </composition>
           <composition name="ring" envelope="RING">{command}</composition>"#
    ))
}

#[test]
fn rotations_stay_orthonormal() {
    let angles = [
        DVec3::new(0.3, 0.0, 0.0),
        DVec3::new(0.0, -1.2, 0.0),
        DVec3::new(0.0, 0.0, 2.5),
        DVec3::new(0.4, 1.1, -0.7),
    ];
    let mut frame = ReferenceFrame::default();
    for omega in angles {
        frame.rotate(omega);
        assert!(frame.is_orthonormal(1e-12));
    }
}

#[test]
fn materials_are_registered_once_per_definition() {
    let mut doc = document(
        r#"<element name="Air2" z="7.3" a="14.6"><real name="density" value="0.0012"/></element>
           <box name="HALL" X_Y_Z="500 500 500" material="Air"/>
           <box name="A" X_Y_Z="1 1 1" material="Air"/>
           <box name="B" X_Y_Z="1 1 1" material="Air"/>
           <box name="C" X_Y_Z="1 1 1" material="Air2"/>
           <composition name="everything" envelope="HALL">
             <posXYZ volume="A"/>
             <posXYZ volume="B"/>
             <posXYZ volume="C"/>
           </composition>"#,
    );
    let log = run(&mut doc).unwrap();

    let materials: Vec<(String, u32)> = log
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::SolidRegistered { name, material, .. } => Some((name.clone(), *material)),
            _ => None,
        })
        .collect();
    assert_eq!(
        materials,
        vec![
            ("HALL".to_string(), 1),
            ("A".to_string(), 1),
            ("B".to_string(), 1),
            ("C".to_string(), 2),
        ]
    );
    assert_eq!(log.of_kind("MaterialRegistered").count(), 2);
}

#[test]
fn equal_halves_keep_their_density() {
    let mut doc = document(
        r#"<material name="P" z="5" a="10"><real name="density" value="3.2"/></material>
           <material name="Q" z="9" a="19"><real name="density" value="3.2"/></material>
           <composite name="PQ">
             <addmaterial material="P"><fractionmass fraction="0.5"/></addmaterial>
             <addmaterial material="Q"><fractionmass fraction="0.5"/></addmaterial>
           </composite>
           <box name="HALL" X_Y_Z="500 500 500" material="PQ"/>
           <composition name="everything" envelope="HALL"/>"#,
    );
    let log = run(&mut doc).unwrap();

    let density = log
        .events()
        .iter()
        .find_map(|event| match event {
            Event::MaterialRegistered { substance, .. } if substance.name == "PQ" => {
                Some(substance.density)
            }
            _ => None,
        })
        .unwrap();
    assert_relative_eq!(density, 3.2, max_relative = 1e-12);
}

#[test]
fn implied_phi_repetition_divides_the_ring() {
    let mut doc = ring(r#"<mposPhi volume="CELL" ncopy="12" Phi0="0" R_Z="15 0" impliedRot="true"/>"#);
    let log = run(&mut doc).unwrap();

    let divisions: Vec<&Event> = log.of_kind("DivisionRegistered").collect();
    assert_eq!(divisions.len(), 1);
    match divisions[0] {
        Event::DivisionRegistered { axis, copies, step, .. } => {
            assert_eq!(*axis, DivisionAxis::Phi);
            assert_eq!(*copies, 12);
            assert_relative_eq!(*step, 2.0 * PI / 12.0);
        }
        other => panic!("expected a division, got {other:?}"),
    }

    let cells: Vec<&Event> = log
        .of_kind("Placement")
        .filter(|event| matches!(event, Event::Placement { child_name, .. } if child_name == "CELL"))
        .collect();
    assert_eq!(cells.len(), 1);
    match cells[0] {
        Event::Placement { parent_name, translation, rotation, .. } => {
            assert_eq!(parent_name, "sd01");
            assert_eq!(*translation, DVec3::new(15.0, 0.0, 0.0));
            assert_eq!(*rotation, None);
        }
        other => panic!("expected a placement, got {other:?}"),
    }
}

#[test]
fn plain_phi_repetition_places_each_copy() {
    let mut doc = ring(
        r#"<mposPhi volume="CELL" ncopy="6" Phi0="15" dPhi="60" R_Z="15 2" unit_angle="deg"/>"#,
    );
    let log = run(&mut doc).unwrap();

    assert_eq!(log.of_kind("DivisionRegistered").count(), 0);
    let positions: Vec<DVec3> = log
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::Placement { child_name, translation, .. } if child_name == "CELL" => {
                Some(*translation)
            }
            _ => None,
        })
        .collect();
    assert_eq!(positions.len(), 6);
    for (i, position) in positions.iter().enumerate() {
        let phi = (15.0 + 60.0 * i as f64).to_radians();
        assert_relative_eq!(position.x, 15.0 * phi.cos(), epsilon = 1e-9);
        assert_relative_eq!(position.y, 15.0 * phi.sin(), epsilon = 1e-9);
        assert_relative_eq!(position.z, 2.0);
    }
}

#[test]
fn envelope_reuse_leaves_the_emitter_untouched() {
    let mut doc = document(
        r#"<box name="HALL" X_Y_Z="500 500 500" material="Air"/>
           <box name="SHELL" X_Y_Z="1 1 1" material="Air"/>
           <box name="CELL" X_Y_Z="1 1 1" material="Iron"/>
           <composition name="first" envelope="SHELL"><posXYZ volume="CELL"/></composition>
           <composition name="second" envelope="SHELL"><posXYZ volume="CELL"/></composition>
           <composition name="everything" envelope="HALL">
             <posXYZ volume="first"/>
             <posXYZ volume="second"/>
           </composition>"#,
    );
    let mut log = EventLog::new();
    let root = doc.lookup("everything").unwrap();
    let err = translate(&mut doc, root, &mut log).unwrap_err();

    assert!(matches!(err, TranslateError::EnvelopeReuse { .. }));
    assert!(err.is_structural());
    assert!(log.is_empty());
}

#[test]
fn every_run_starts_from_fresh_identifiers() {
    let mut doc = ring(r#"<mposPhi volume="CELL" ncopy="12" R_Z="15 0" impliedRot="true"/>"#);
    let first = run(&mut doc).unwrap();
    let second = run(&mut doc).unwrap();
    assert_eq!(first.events(), second.events());

    match &second.events()[0] {
        Event::MaterialRegistered { id, .. } => assert_eq!(*id, 1),
        other => panic!("expected a material first, got {other:?}"),
    }
    let first_solid = second
        .events()
        .iter()
        .find_map(|event| match event {
            Event::SolidRegistered { id, .. } => Some(*id),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_solid, 1);
}

#[test]
fn restricted_emitter_rejects_unsupported_divisions() {
    let mut doc = ring(r#"<mposPhi volume="CELL" ncopy="12" R_Z="15 0" impliedRot="true"/>"#);
    let mut log = EventLog::with_division_axes(&[DivisionAxis::Z]);
    let root = doc.lookup("everything").unwrap();
    let err = translate(&mut doc, root, &mut log).unwrap_err();
    assert_eq!(
        err,
        TranslateError::UnsupportedDivisionAxis {
            volume: "RING".to_string(),
            axis: "phi".to_string(),
        }
    );
}

#[test]
fn root_volume_comes_from_the_config() {
    let mut doc = ring(r#"<posXYZ volume="CELL"/>"#);
    let mut log = EventLog::new();
    let summary = translate_document(&mut doc, &mut log, &TranslationConfig::default()).unwrap();
    assert_eq!(summary.top_volume.as_deref(), Some("HALL"));
    assert_eq!(summary.placements, 2);

    let config = TranslationConfig::new("nowhere", 1.0e-9, 16).unwrap();
    let err = translate_document(&mut doc, &mut EventLog::new(), &config).unwrap_err();
    assert!(matches!(err, TranslateError::UnknownVolume { ref name, .. } if name == "nowhere"));
}

#[test]
fn event_streams_dump_as_json() {
    let mut doc = ring(r#"<mposPhi volume="CELL" ncopy="4" R_Z="15 0" impliedRot="true"/>"#);
    let log = run(&mut doc).unwrap();

    let json = serde_json::to_value(log.events()).unwrap();
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "MaterialRegistered",
            "SolidRegistered",
            "SolidRegistered",
            "Placement",
            "DivisionRegistered",
            "MaterialRegistered",
            "SolidRegistered",
            "Placement",
        ]
    );
}

#[test]
fn identifier_lists_come_back_with_the_summary() {
    let mut doc = document(
        r#"<box name="HALL" X_Y_Z="500 500 500" material="Air"/>
           <box name="SLAB" X_Y_Z="1 1 1" material="Iron"/>
           <composition name="everything" envelope="HALL">
             <posXYZ volume="stack"/>
             <posXYZ volume="ring"/>
           </composition>
           <composition name="stack">
             <mposZ volume="SLAB" ncopy="3" dZ="2">
               <identifier field="layer" value="1" step="1"/>
             </mposZ>
           </composition>
           <tubs name="RING" Rio_Z="10 20 5" material="Air"/>
           <box name="CELL" X_Y_Z="1 1 1" material="Iron"/>
           <composition name="ring" envelope="RING">
             <mposPhi volume="CELL" ncopy="4" impliedRot="true" R_Z="15 0">
               <identifier field="sector" value="10" step="-2"/>
             </mposPhi>
           </composition>"#,
    );
    let mut log = EventLog::new();
    let root = doc.lookup("everything").unwrap();
    let summary = translate(&mut doc, root, &mut log).unwrap();

    assert_eq!(
        summary.identifiers,
        vec![
            IdentifierList {
                volume: "SLAB".to_string(),
                field: "layer".to_string(),
                values: vec![1, 2, 3],
            },
            IdentifierList {
                volume: "sd01".to_string(),
                field: "sector".to_string(),
                values: vec![10, 8, 6, 4],
            },
        ]
    );
}

#[test]
fn void_components_keep_an_explicit_density() {
    let mut doc = document(
        r#"<material name="Void" z="1" a="1"><real name="density" value="0"/></material>
           <composite name="Mix">
             <real name="density" value="5.0"/>
             <addmaterial material="Iron"><fractionmass fraction="0.5"/></addmaterial>
             <addmaterial material="Void"><fractionmass fraction="0.5"/></addmaterial>
           </composite>
           <box name="HALL" X_Y_Z="500 500 500" material="Mix"/>
           <composition name="everything" envelope="HALL"/>"#,
    );
    let log = run(&mut doc).unwrap();

    let density = log
        .events()
        .iter()
        .find_map(|event| match event {
            Event::MaterialRegistered { substance, .. } if substance.name == "Mix" => {
                Some(substance.density)
            }
            _ => None,
        })
        .unwrap();
    assert_relative_eq!(density, 5.0);
}
