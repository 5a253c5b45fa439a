use allknn::{search, KdTree, KnnError, PointMatrix, SearchConfig, SearchMode, SelfMatch};

const MODES: [SearchMode; 3] = [SearchMode::Naive, SearchMode::Single, SearchMode::Dual];

fn square_and_outlier() -> PointMatrix {
    PointMatrix::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap()
}

#[test]
fn test_worked_example() {
    let points = square_and_outlier();
    for mode in MODES {
        let r = search(&points, None, &SearchConfig::new(1).with_mode(mode)).unwrap();

        // (0,0) has two neighbors at distance 1; the lower index wins.
        assert_eq!(r.neighbors_of(0), &[1]);
        assert_eq!(r.neighbors_of(1), &[0]);
        assert_eq!(r.neighbors_of(2), &[0]);
        for j in 0..3 {
            assert_eq!(r.distances_of(j), &[1.0]);
        }
        // (1,0) and (0,1) tie at sqrt(41).
        assert_eq!(r.neighbors_of(3), &[1]);
        assert_eq!(r.distances_of(3), &[41.0f64.sqrt()]);
    }
}

#[test]
fn test_self_is_excluded_by_default() {
    let points = PointMatrix::random(3, 200, 31).unwrap();
    for mode in MODES {
        let r = search(&points, None, &SearchConfig::new(6).with_mode(mode)).unwrap();
        for j in 0..points.len() {
            assert!(!r.neighbors_of(j).contains(&j), "{:?}: point {} lists itself", mode, j);
            assert!(r.distances_of(j)[0] > 0.0);
        }
    }
}

#[test]
fn test_self_included_appears_once_at_zero() {
    // Duplicates of point 0 sit at index 4.
    let points = PointMatrix::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0], [0.0, 0.0]]).unwrap();
    for mode in MODES {
        let config = SearchConfig::new(3).with_mode(mode).with_self_match(SelfMatch::Include).with_leaf_size(1);
        let r = search(&points, None, &config).unwrap();
        for j in 0..points.len() {
            let own = r.neighbors_of(j).iter().filter(|&&n| n == j).count();
            assert_eq!(own, 1, "{:?}: point {} appears {} times", mode, j, own);
            let pos = r.neighbors_of(j).iter().position(|&n| n == j).unwrap();
            assert_eq!(r.distances_of(j)[pos], 0.0);
        }
        // Exact duplicates: both at distance zero, the point itself first.
        assert_eq!(&r.neighbors_of(0)[..2], &[0, 4]);
        assert_eq!(&r.neighbors_of(4)[..2], &[4, 0]);
    }
}

#[test]
fn test_self_included_ahead_of_lower_duplicate() {
    // With k = 1 only one of the zero-distance pair fits; it must be the point itself.
    let points = PointMatrix::from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0], [0.0, 0.0]]).unwrap();
    for mode in MODES {
        for leaf_size in [1, 2, 20] {
            let config = SearchConfig::new(1)
                .with_mode(mode)
                .with_self_match(SelfMatch::Include)
                .with_leaf_size(leaf_size);
            let r = search(&points, None, &config).unwrap();
            for j in 0..points.len() {
                assert_eq!(r.neighbors_of(j), &[j], "{:?}, leaf size {}: point {}", mode, leaf_size, j);
                assert_eq!(r.distances_of(j), &[0.0]);
            }
        }
    }
}

#[test]
fn test_self_match_policy_ignored_for_separate_query() {
    let reference = square_and_outlier();
    let query = square_and_outlier();
    let r = search(&reference, Some(&query), &SearchConfig::new(1)).unwrap();
    for j in 0..4 {
        assert_eq!(r.neighbors_of(j), &[j]);
        assert_eq!(r.distances_of(j), &[0.0]);
    }
}

#[test]
fn test_kth_distance_non_decreasing_in_k() {
    let reference = PointMatrix::random(2, 150, 40).unwrap();
    let query = PointMatrix::random(2, 25, 41).unwrap();
    let mut previous: Option<Vec<f64>> = None;
    for k in 1..10 {
        let r = search(&reference, Some(&query), &SearchConfig::new(k)).unwrap();
        let kth: Vec<f64> = (0..query.len()).map(|j| r.distances_of(j)[k - 1]).collect();
        if let Some(prev) = &previous {
            for (a, b) in prev.iter().zip(&kth) {
                assert!(b >= a);
            }
        }
        previous = Some(kth);
    }
}

#[test]
fn test_result_shape_and_original_order() {
    let reference = PointMatrix::random(3, 120, 60).unwrap();
    let query = PointMatrix::random(3, 17, 61).unwrap();
    let r = search(&reference, Some(&query), &SearchConfig::new(4).with_leaf_size(3)).unwrap();
    assert_eq!(r.k(), 4);
    assert_eq!(r.num_queries(), 17);
    assert_eq!(r.distances.rows(), 4);
    assert_eq!(r.distances.cols(), 17);

    // Column j must describe query j, not query tree position j.
    for j in 0..query.len() {
        let nearest = reference.point(r.neighbors_of(j)[0]);
        let d: f64 = query.point(j).iter().zip(nearest).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt();
        assert_eq!(d, r.distances_of(j)[0]);
    }
}

#[test]
fn test_permutation_round_trip() {
    let points = PointMatrix::random(2, 333, 70).unwrap();
    let tree = KdTree::build(&points, 5).unwrap();
    let old_from_new = tree.old_from_new();
    let new_from_old = tree.new_from_old();
    for i in 0..points.len() {
        assert_eq!(old_from_new[new_from_old[i]], i);
    }
    let mut sorted = old_from_new.to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..points.len()).collect::<Vec<_>>());
}

#[test]
fn test_boundary_rejection() {
    let points = square_and_outlier();
    for mode in MODES {
        let err = search(&points, None, &SearchConfig::new(0).with_mode(mode)).unwrap_err();
        assert!(matches!(err, KnnError::InvalidK { k: 0, .. }));
        let err = search(&points, None, &SearchConfig::new(4).with_mode(mode)).unwrap_err();
        assert!(matches!(err, KnnError::InvalidK { k: 4, reference_points: 4 }));
        let err = search(&points, None, &SearchConfig::new(1).with_mode(mode).with_leaf_size(0)).unwrap_err();
        assert!(matches!(err, KnnError::InvalidLeafSize(0)));
        assert!(err.is_invalid_argument());
    }
}

#[test]
fn test_dimension_mismatch_rejected() {
    let reference = square_and_outlier();
    let query = PointMatrix::from_points(&[[0.0, 0.0, 0.0]]).unwrap();
    let err = search(&reference, Some(&query), &SearchConfig::new(1)).unwrap_err();
    assert!(matches!(err, KnnError::DimensionMismatch { expected: 2, actual: 3 }));
}

#[test]
fn test_empty_and_non_finite_rejected() {
    let reference = square_and_outlier();
    let empty = PointMatrix::from_points::<[f64; 2]>(&[]).unwrap();
    assert!(matches!(search(&empty, None, &SearchConfig::new(1)), Err(KnnError::EmptyPointSet(_))));
    assert!(matches!(search(&reference, Some(&empty), &SearchConfig::new(1)), Err(KnnError::EmptyPointSet("query"))));

    let bad = PointMatrix::from_points(&[[0.0, f64::INFINITY]]).unwrap();
    assert!(matches!(search(&reference, Some(&bad), &SearchConfig::new(1)), Err(KnnError::NonFinite { .. })));
}

#[test]
fn test_identical_points() {
    let points = PointMatrix::from_points(&vec![[3.0, 3.0, 3.0]; 50]).unwrap();
    for mode in MODES {
        let r = search(&points, None, &SearchConfig::new(3).with_mode(mode).with_leaf_size(1)).unwrap();
        assert_eq!(r.neighbors_of(0), &[1, 2, 3]);
        assert_eq!(r.neighbors_of(10), &[0, 1, 2]);
        assert_eq!(r.distances_of(49), &[0.0, 0.0, 0.0]);
    }
}

#[test]
fn test_config_from_json() {
    let config: SearchConfig = serde_json::from_str(r#"{"k": 5, "mode": "single"}"#).unwrap();
    assert_eq!(config.k, 5);
    assert_eq!(config.mode, SearchMode::Single);
    assert_eq!(config.leaf_size, 20);
    assert_eq!(config.self_match, SelfMatch::Exclude);

    let json = serde_json::to_string(&config.clone().with_self_match(SelfMatch::Include)).unwrap();
    assert!(json.contains(r#""self_match":"include""#));
}
