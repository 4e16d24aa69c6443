// End-to-end unionizer scenarios: endpoint joining under the three
// heuristics, tag reconciliation, directionality and the fixed-point
// iteration bounds.

use geo::{coord, Rect};
use tilepost::{
    Feature, Geometry, Layer, MapContext, PostProcess, Unionizer, UnionizerConfig, Value,
};

fn line(coords: &[(f64, f64)]) -> Geometry {
    Geometry::LineString(coords.iter().map(|&(x, y)| coord! { x: x, y: y }).collect())
}

fn coords(geom: &Geometry) -> Vec<(f64, f64)> {
    match geom {
        Geometry::LineString(line) => line.iter().map(|c| (c.x, c.y)).collect(),
        other => panic!("expected linestring, got {other:?}"),
    }
}

fn ctx() -> MapContext {
    MapContext::new(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }))
}

fn road_segment(id: u64, from: (f64, f64), to: (f64, f64)) -> Feature {
    Feature::new(id)
        .with_attr("road", "main")
        .with_geometry(line(&[from, to]))
}

fn unionizer(config: UnionizerConfig) -> Unionizer {
    Unionizer::new(config).unwrap()
}

fn match_road() -> UnionizerConfig {
    UnionizerConfig { match_tags: vec!["road".to_string()], ..UnionizerConfig::default() }
}

#[test]
fn collinear_linestrings_merge_under_greedy() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)));

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 1);
    let merged = &layer.features()[0];
    assert_eq!(merged.num_geometries(), 1);
    assert_eq!(coords(&merged.geometries()[0]), vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
    assert_eq!(merged.get("road"), Some(&Value::Str("main".into())));
}

#[test]
fn intersect_strategy_drops_disagreeing_tags() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)).with_attr("ref", "A1"))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)).with_attr("ref", "A2"));

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 1);
    let merged = &layer.features()[0];
    assert_eq!(merged.get("road"), Some(&Value::Str("main".into())));
    assert!(merged.get("ref").unwrap().is_null());
}

#[test]
fn accumulate_strategy_copies_one_sided_tags() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)).with_attr("ref", "A1"))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)).with_attr("name", "X"));

    let config = UnionizerConfig { tag_strategy: "accumulate".to_string(), ..match_road() };
    unionizer(config).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 1);
    let merged = &layer.features()[0];
    assert_eq!(merged.get("road"), Some(&Value::Str("main".into())));
    assert!(merged.get("ref").unwrap().is_null());
    assert_eq!(merged.get("name"), Some(&Value::Str("X".into())));
}

#[test]
fn directional_back_to_front_merges_without_reversal() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)).with_attr("oneway", "yes"))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)).with_attr("oneway", "yes"));

    let config = UnionizerConfig {
        preserve_direction_tags: vec!["oneway".to_string()],
        ..match_road()
    };
    unionizer(config).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 1);
    // Vertex order is first feature then the second's tail, never reversed.
    assert_eq!(
        coords(&layer.features()[0].geometries()[0]),
        vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]
    );
}

#[test]
fn directional_back_to_back_is_refused() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)).with_attr("oneway", "yes"))
        .with_feature(road_segment(2, (2.0, 0.0), (1.0, 0.0)).with_attr("oneway", "yes"));

    let config = UnionizerConfig {
        preserve_direction_tags: vec!["oneway".to_string()],
        ..match_road()
    };
    unionizer(config).process(&mut layer, &ctx()).unwrap();

    // Both ends meet back-to-back; joining would reverse one side.
    assert_eq!(layer.len(), 2);
    assert_eq!(coords(&layer.features()[0].geometries()[0]), vec![(0.0, 0.0), (1.0, 0.0)]);
    assert_eq!(coords(&layer.features()[1].geometries()[0]), vec![(2.0, 0.0), (1.0, 0.0)]);
}

#[test]
fn signed_zero_endpoints_still_meet() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (-1.0, 0.0), (0.0, -0.0)))
        .with_feature(road_segment(2, (0.0, 0.0), (1.0, 0.0)));

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();

    // -0.0 and 0.0 are the same endpoint.
    assert_eq!(layer.len(), 1);
    assert_eq!(
        coords(&layer.features()[0].geometries()[0]),
        vec![(-1.0, 0.0), (0.0, 0.0), (1.0, 0.0)]
    );
}

#[test]
fn mismatched_tag_values_never_merge() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
        .with_feature(
            Feature::new(2)
                .with_attr("road", "side")
                .with_geometry(line(&[(1.0, 0.0), (2.0, 0.0)])),
        );

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();
    assert_eq!(layer.len(), 2);
}

#[test]
fn obtuse_joins_the_straight_continuation() {
    // Three lines meeting at the origin: straight-through pair plus a spur.
    let mut layer = Layer::new("roads")
        .with_feature(Feature::new(1).with_geometry(line(&[(-1.0, 0.0), (0.0, 0.0)])))
        .with_feature(Feature::new(2).with_geometry(line(&[(0.0, 0.0), (1.0, 0.0)])))
        .with_feature(Feature::new(3).with_geometry(line(&[(0.0, 0.0), (0.0, 1.0)])));

    let config = UnionizerConfig {
        union_heuristic: "obtuse".to_string(),
        ..UnionizerConfig::default()
    };
    unionizer(config).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 2);
    let merged = &layer.features()[0];
    assert_eq!(
        coords(&merged.geometries()[0]),
        vec![(-1.0, 0.0), (0.0, 0.0), (1.0, 0.0)]
    );
    // The spur is left alone.
    assert_eq!(coords(&layer.features()[1].geometries()[0]), vec![(0.0, 0.0), (0.0, 1.0)]);
}

#[test]
fn acute_tie_breaks_by_candidate_order() {
    let mut layer = Layer::new("roads")
        .with_feature(Feature::new(1).with_geometry(line(&[(-1.0, 0.0), (0.0, 0.0)])))
        .with_feature(Feature::new(2).with_geometry(line(&[(0.0, 0.0), (1.0, 0.0)])))
        .with_feature(Feature::new(3).with_geometry(line(&[(0.0, 0.0), (0.0, 1.0)])));

    let config = UnionizerConfig {
        union_heuristic: "acute".to_string(),
        ..UnionizerConfig::default()
    };
    unionizer(config).process(&mut layer, &ctx()).unwrap();

    // The reflex pairs (1,3) and (2,3) tie; candidate order is
    // deterministic, so feature 1 wins the spur.
    assert_eq!(layer.len(), 2);
    assert_eq!(
        coords(&layer.features()[0].geometries()[0]),
        vec![(-1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]
    );
    assert_eq!(coords(&layer.features()[1].geometries()[0]), vec![(0.0, 0.0), (1.0, 0.0)]);
}

#[test]
fn linestrings_within_one_feature_join() {
    let mut layer = Layer::new("roads").with_feature(
        Feature::new(1)
            .with_geometry(line(&[(0.0, 0.0), (1.0, 0.0)]))
            .with_geometry(line(&[(1.0, 0.0), (2.0, 0.0)])),
    );

    unionizer(UnionizerConfig::default()).process(&mut layer, &ctx()).unwrap();

    assert_eq!(layer.len(), 1);
    assert_eq!(layer.features()[0].num_geometries(), 1);
    assert_eq!(
        coords(&layer.features()[0].geometries()[0]),
        vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]
    );
}

#[test]
fn iteration_cap_limits_chained_merges() {
    let chain = || {
        Layer::new("roads")
            .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
            .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)))
            .with_feature(road_segment(3, (2.0, 0.0), (3.0, 0.0)))
    };

    // One iteration merges one pair; the second pair waits for the next.
    let mut capped = chain();
    let config = UnionizerConfig { max_iterations: 1, ..match_road() };
    unionizer(config).process(&mut capped, &ctx()).unwrap();
    assert_eq!(capped.len(), 2);

    let mut unbounded = chain();
    unionizer(match_road()).process(&mut unbounded, &ctx()).unwrap();
    assert_eq!(unbounded.len(), 1);
    assert_eq!(
        coords(&unbounded.features()[0].geometries()[0]),
        vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]
    );
}

#[test]
fn merge_preserves_every_vertex() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)))
        .with_feature(road_segment(3, (2.0, 0.0), (3.0, 0.0)));

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();

    let mut seen: Vec<(f64, f64)> = layer
        .features()
        .iter()
        .flat_map(|f| f.geometries())
        .flat_map(coords)
        .collect();
    seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
    // Interior endpoints are kept once each; nothing new appears.
    assert_eq!(seen, vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
}

#[test]
fn converged_layer_is_left_unchanged() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)));

    let u = unionizer(match_road());
    u.process(&mut layer, &ctx()).unwrap();
    let after_first = layer.features().to_vec();

    u.process(&mut layer, &ctx()).unwrap();
    assert_eq!(layer.features(), &after_first[..]);
}

#[test]
fn no_feature_is_left_empty() {
    let mut layer = Layer::new("roads")
        .with_feature(road_segment(1, (0.0, 0.0), (1.0, 0.0)))
        .with_feature(road_segment(2, (1.0, 0.0), (2.0, 0.0)))
        .with_feature(road_segment(3, (1.0, 0.0), (1.0, 5.0)));

    unionizer(match_road()).process(&mut layer, &ctx()).unwrap();

    assert!(layer.features().iter().all(|f| f.num_geometries() > 0));
}
