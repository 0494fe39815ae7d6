//! Property-based tests for the geometry engine and the render/locate pair.
//!
//! Focus: the containment invariant, the reflection rule, and recovering the
//! ball centre from a synthesized frame.

use proptest::prelude::*;

use bounce_core::{Bgr, Centroid, GeometryState, advance, locate, render, vision};

fn nonzero_velocity() -> impl Strategy<Value = i32> {
    prop_oneof![
        4 => -12i32..=-1,
        4 => 1i32..=12,
        1 => (i32::MIN + 1)..=-13,
        1 => 13i32..=i32::MAX,
    ]
}

fn valid_state() -> impl Strategy<Value = GeometryState> {
    (24i32..320, 24i32..320)
        .prop_flat_map(|(height, width)| {
            let max_radius = (height.min(width) - 1) / 2;
            (Just((height, width)), 1..=max_radius)
        })
        .prop_flat_map(|((height, width), radius)| {
            (
                Just((height, width)),
                Just(radius),
                radius..=width - radius,
                radius..=height - radius,
                nonzero_velocity(),
                nonzero_velocity(),
            )
        })
        .prop_map(|(bounds, radius, x, y, vx, vy)| GeometryState {
            position: (x, y),
            velocity: (vx, vy),
            radius,
            bounds,
        })
}

fn bright_color() -> impl Strategy<Value = Bgr> {
    any::<[u8; 3]>()
        .prop_filter("ball must be brighter than the threshold", |c| {
            vision::luma(c[0], c[1], c[2]) > vision::THRESHOLD
        })
        .prop_map(Bgr)
}

proptest! {
    #[test]
    fn position_stays_inside_the_walls(state in valid_state(), steps in 1usize..400) {
        let (low_x, high_x) = (state.radius, state.width() - state.radius);
        let (low_y, high_y) = (state.radius, state.height() - state.radius);

        let mut current = state;
        for _ in 0..steps {
            current = advance(&current);
            prop_assert!((low_x..=high_x).contains(&current.position.0));
            prop_assert!((low_y..=high_y).contains(&current.position.1));
            prop_assert_ne!(current.velocity.0, 0);
            prop_assert_ne!(current.velocity.1, 0);
        }
    }

    #[test]
    fn velocity_flips_iff_a_wall_was_reached(state in valid_state(), steps in 0usize..200) {
        let mut current = state;
        for _ in 0..steps {
            current = advance(&current);
        }

        let next = advance(&current);
        let r = current.radius;

        let raw_x = i64::from(current.position.0) + i64::from(current.velocity.0);
        let hit_x = raw_x >= i64::from(current.width() - r) || raw_x <= i64::from(r);
        prop_assert_eq!(next.velocity.0 == -current.velocity.0, hit_x);

        let raw_y = i64::from(current.position.1) + i64::from(current.velocity.1);
        let hit_y = raw_y >= i64::from(current.height() - r) || raw_y <= i64::from(r);
        prop_assert_eq!(next.velocity.1 == -current.velocity.1, hit_y);
    }

    #[test]
    fn advance_is_deterministic(state in valid_state(), steps in 1usize..100) {
        let mut a = state;
        let mut b = state;
        for _ in 0..steps {
            a = advance(&a);
            b = b.advance();
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn locate_recovers_the_rendered_centre(
        state in valid_state().prop_filter("radius too small to see", |s| s.radius >= 5),
        color in bright_color(),
    ) {
        let frame = render(&state, color);
        let Centroid { x, y } = locate(&frame).unwrap();

        prop_assert!((i64::from(x) - i64::from(state.position.0)).abs() <= 1);
        prop_assert!((i64::from(y) - i64::from(state.position.1)).abs() <= 1);
    }
}
