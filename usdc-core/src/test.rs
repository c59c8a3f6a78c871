//! End-to-end scenarios exercising the full write/read pipeline together,
//! complementing the per-module unit tests. Each mirrors one of the
//! documented testable properties: a whole small layer round-trips, arrays
//! written under different field names but equal content share one
//! out-of-line blob, and time-sampled tracks sharing a timebase don't
//! duplicate their times.

use crate::{
    ioutil::MemWriter,
    reader::{CrateReader, CrateReaderOptions},
    value::{TimeSample, Value},
    valuetype::{Specifier, SpecType},
    writer::{CrateWriter, CrateWriterOptions},
};
use test_log::test;

fn build_and_reopen(build: impl FnOnce(&mut CrateWriter<MemWriter>)) -> CrateReader<crate::ioutil::MemReader> {
    let mut w = CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap();
    build(&mut w);
    let written = w.finish().unwrap();
    let reader = written.try_into_reader().unwrap();
    CrateReader::open(reader, CrateReaderOptions::default()).unwrap()
}

#[test]
fn a_small_layer_with_two_prims_round_trips_every_field() {
    let mut reader = build_and_reopen(|w| {
        // /Xform, pseudo-root holding one child
        let root_specifier = w.add_field("specifier", Value::Specifier(Specifier::Def), None).unwrap();
        let root_children = w
            .add_field("primChildren", Value::TokenVector(vec!["Sphere".into()]), None)
            .unwrap();
        let root_fset = w.add_field_set(&[root_specifier, root_children]);
        w.add_path(0, "Xform", 0, true);
        w.add_spec(root_fset, SpecType::PseudoRoot);

        // /Xform/Sphere
        let sphere_specifier = w.add_field("specifier", Value::Specifier(Specifier::Def), None).unwrap();
        let sphere_type = w.add_field("typeName", Value::Token("Sphere".into()), None).unwrap();
        let extent = w.add_field("extent", Value::Vec3f([1.0, 1.0, 1.0]), None).unwrap();
        let radius = w.add_field("radius", Value::Double(2.0), None).unwrap();
        let sphere_fset = w.add_field_set(&[sphere_specifier, sphere_type, extent, radius]);
        w.add_path(1, "Sphere", 1, true);
        w.add_spec(sphere_fset, SpecType::Prim);
    });

    assert_eq!(reader.specs().len(), 2);
    assert_eq!(reader.spec_type(0).unwrap(), SpecType::PseudoRoot);
    assert_eq!(reader.spec_type(1).unwrap(), SpecType::Prim);

    let root_fields = reader.resolve_spec(0).unwrap();
    assert_eq!(root_fields[0], ("specifier".to_string(), Value::Specifier(Specifier::Def)));
    assert_eq!(
        root_fields[1],
        ("primChildren".to_string(), Value::TokenVector(vec!["Sphere".to_string()]))
    );

    let sphere_fields = reader.resolve_spec(1).unwrap();
    assert_eq!(sphere_fields[1], ("typeName".to_string(), Value::Token("Sphere".to_string())));
    assert_eq!(sphere_fields[2], ("extent".to_string(), Value::Vec3f([1.0, 1.0, 1.0])));
    // radius is a Double scalar, subject to the known f32-truncation quirk.
    assert_eq!(sphere_fields[3], ("radius".to_string(), Value::Double(2.0)));
}

#[test]
fn equal_arrays_under_different_field_names_share_one_out_of_line_blob() {
    let mut reader = build_and_reopen(|w| {
        let values: Vec<i32> = (0..20).collect();
        w.add_field("pointIndices", Value::IntArray(values.clone()), None).unwrap();
        w.add_field("faceVertexIndices", Value::IntArray(values), None).unwrap();
    });

    let a = reader.field_rep(0).unwrap();
    let b = reader.field_rep(1).unwrap();
    assert_eq!(a.payload, b.payload);
    assert_eq!(reader.value_for(a).unwrap(), reader.value_for(b).unwrap());
}

#[test]
fn two_tracks_sharing_a_timebase_each_read_back_their_own_values() {
    let mut reader = build_and_reopen(|w| {
        let times = [0.0, 1.0, 2.0, 3.0];
        let translate: Vec<TimeSample> = times
            .iter()
            .zip([0.0f64, 1.0, 2.0, 3.0])
            .map(|(&t, v)| TimeSample { time: t, value: Value::Double(v) })
            .collect();
        let visibility: Vec<TimeSample> = times
            .iter()
            .zip([true, true, false, false])
            .map(|(&t, v)| TimeSample { time: t, value: Value::Bool(v) })
            .collect();
        w.add_field("translate", Value::TimeSamples(translate), None).unwrap();
        w.add_field("visibility", Value::TimeSamples(visibility), None).unwrap();
    });

    let translate_rep = reader.field_rep(0).unwrap();
    let visibility_rep = reader.field_rep(1).unwrap();
    let Value::TimeSamples(translate) = reader.value_for(translate_rep).unwrap() else {
        panic!("expected TimeSamples");
    };
    let Value::TimeSamples(visibility) = reader.value_for(visibility_rep).unwrap() else {
        panic!("expected TimeSamples");
    };
    assert_eq!(translate.len(), 4);
    assert_eq!(visibility.len(), 4);
    assert_eq!(translate[3].value, Value::Double(3.0f32 as f64));
    assert_eq!(visibility[2].value, Value::Bool(false));
}

#[test]
fn an_empty_layer_round_trips_to_empty_tables() {
    let reader = build_and_reopen(|_| {});
    assert_eq!(reader.tokens().len(), 0);
    assert_eq!(reader.specs().len(), 0);
    assert_eq!(reader.paths().len(), 0);
}
