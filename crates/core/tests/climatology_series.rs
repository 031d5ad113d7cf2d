//! Climatologies over observation series

mod common;

use approx::assert_relative_eq;
use common::{stable_tower, unstable_grass};
use ffp_core::{
    compute_footprint, compute_footprint_climatology, Domain, FootprintError, FootprintInput,
    FootprintOptions, InputError,
};

fn options(smooth: bool) -> FootprintOptions {
    FootprintOptions {
        domain: Domain::centered(300.0),
        nx: 61,
        smooth,
    }
}

fn series() -> Vec<FootprintInput> {
    (0..8)
        .map(|i| {
            let i = f64::from(i);
            FootprintInput::roughness_based(
                4.0,
                0.05,
                600.0 + 50.0 * i,
                -200.0 + 45.0 * i,
                0.4 + 0.05 * i,
                0.25 + 0.02 * i,
                Some(30.0 * i),
            )
        })
        .collect()
}

#[test]
fn single_member_equals_single_footprint() {
    for smooth in [false, true] {
        let input = unstable_grass();
        let single = compute_footprint(&input, &options(smooth)).unwrap();
        let clim = compute_footprint_climatology(&[input], &options(smooth)).unwrap();
        assert_eq!(clim.n, 1);
        assert!(clim.skipped.is_empty());
        assert_eq!(clim.field.x, single.x);
        assert_eq!(clim.field.y, single.y);
        for (a, b) in clim.field.f.iter().zip(single.f.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-12, epsilon = 1e-300);
        }
    }
}

#[test]
fn order_of_members_does_not_matter() {
    let forward = series();
    let mut reversed = forward.clone();
    reversed.reverse();
    let mut shuffled = forward.clone();
    shuffled.rotate_left(3);

    let reference = compute_footprint_climatology(&forward, &options(true)).unwrap();
    for permuted in [reversed, shuffled] {
        let other = compute_footprint_climatology(&permuted, &options(true)).unwrap();
        assert_eq!(other.n, reference.n);
        for (a, b) in other.field.f.iter().zip(reference.field.f.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-10, epsilon = 1e-300);
        }
    }
}

#[test]
fn climatology_is_mean_of_members() {
    let members = [unstable_grass(), stable_tower()];
    let clim = compute_footprint_climatology(&members, &options(false)).unwrap();
    let a = compute_footprint(&members[0], &options(false)).unwrap();
    let b = compute_footprint(&members[1], &options(false)).unwrap();
    let mean = (a.f + b.f) / 2.0;
    for (c, m) in clim.field.f.iter().zip(mean.iter()) {
        assert_relative_eq!(c, m, max_relative = 1e-12, epsilon = 1e-300);
    }
}

#[test]
fn all_failing_series_has_no_footprints() {
    let mut bad = series();
    for input in &mut bad {
        input.ustar = 0.01;
    }
    assert_eq!(
        compute_footprint_climatology(&bad, &options(true)),
        Err(FootprintError::NoValidFootprints)
    );
}

#[test]
fn mixed_series_counts_only_valid_members() {
    let mut mixed = series();
    mixed[1].h = 5.0;
    mixed[4].wind_dir = Some(-10.0);
    mixed[6].sigmav = 0.0;

    let result = compute_footprint_climatology(&mixed, &options(true)).unwrap();
    assert_eq!(result.n, 5);
    let indices: Vec<usize> = result.skipped.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 4, 6]);
    assert_eq!(
        result.skipped[1].reason,
        FootprintError::InvalidInput(InputError::WindDirection { wind_dir: -10.0 })
    );

    // Skipped members are excluded, not averaged in as zeros
    let valid: Vec<FootprintInput> = mixed
        .iter()
        .enumerate()
        .filter(|(i, _)| ![1, 4, 6].contains(i))
        .map(|(_, input)| *input)
        .collect();
    let expected = compute_footprint_climatology(&valid, &options(true)).unwrap();
    for (a, b) in result.field.f.iter().zip(expected.field.f.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-10, epsilon = 1e-300);
    }
}
