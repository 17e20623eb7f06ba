use crate::{ConfigError, Dims, DynamicAxes, DYNAMIC_DIM};

/// Builds `[batch_size] + static_dims`, then marks every axis named in
/// `dynamic_axes` with [`DYNAMIC_DIM`].
///
/// Axis 0 is the batch axis; it has to appear in `dynamic_axes` for the
/// batch size to stay unconstrained at serving time. An axis past the
/// tensor's rank is a malformed map and fails with
/// [`ConfigError::AxisOutOfRange`].
pub fn resolve_dims(
    tensor: &str,
    batch_size: usize,
    static_dims: &[usize],
    dynamic_axes: Option<&DynamicAxes>,
) -> Result<Dims, ConfigError> {
    let mut dims = Dims::default();
    dims.0.push(extent(tensor, batch_size)?);
    for d in static_dims {
        dims.0.push(extent(tensor, *d)?);
    }

    if let Some(axes) = dynamic_axes {
        let rank = dims.rank();
        for axis in axes.keys().copied() {
            let slot = dims.0.get_mut(axis).ok_or_else(|| ConfigError::AxisOutOfRange {
                tensor: tensor.to_string(),
                axis,
                rank,
            })?;
            *slot = DYNAMIC_DIM;
        }
    }

    Ok(dims)
}

fn extent(tensor: &str, d: usize) -> Result<i64, ConfigError> {
    if d == 0 {
        return Err(ConfigError::MalformedMetadata(format!(
            "tensor `{tensor}` has a zero extent"
        )));
    }
    i64::try_from(d).map_err(|_| {
        ConfigError::MalformedMetadata(format!("tensor `{tensor}` extent {d} overflows i64"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(pairs: &[(usize, &str)]) -> DynamicAxes {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn static_shape_is_prefixed_with_batch() {
        for (batch, dims) in [(1usize, vec![3usize, 224, 224]), (8, vec![1000]), (2, vec![])] {
            let resolved = resolve_dims("t", batch, &dims, None).unwrap();
            let mut expected = vec![batch as i64];
            expected.extend(dims.iter().map(|d| *d as i64));
            assert_eq!(resolved.as_slice(), expected.as_slice());
        }
    }

    #[test]
    fn empty_axis_map_changes_nothing() {
        let resolved = resolve_dims("t", 4, &[16], Some(&DynamicAxes::new())).unwrap();
        assert_eq!(resolved, [4, 16]);
    }

    #[test]
    fn batch_axis_becomes_dynamic_for_any_batch_size() {
        for batch in [1usize, 7, 256] {
            let resolved = resolve_dims("t", batch, &[10], Some(&axes(&[(0, "batch")]))).unwrap();
            assert_eq!(resolved.as_slice()[0], DYNAMIC_DIM);
            assert!(resolved.is_dynamic(0));
        }
    }

    #[test]
    fn spatial_axes_become_dynamic() {
        let map = axes(&[(0, "batch"), (2, "height"), (3, "width")]);
        let resolved = resolve_dims("input", 1, &[3, 224, 224], Some(&map)).unwrap();
        assert_eq!(resolved, [-1, 3, -1, -1]);
    }

    #[test]
    fn axis_past_rank_is_rejected() {
        let err = resolve_dims("input", 1, &[3], Some(&axes(&[(2, "oops")]))).unwrap_err();
        match err {
            ConfigError::AxisOutOfRange { tensor, axis, rank } => {
                assert_eq!(tensor, "input");
                assert_eq!(axis, 2);
                assert_eq!(rank, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_extent_is_malformed() {
        assert!(matches!(
            resolve_dims("t", 1, &[0], None),
            Err(ConfigError::MalformedMetadata(_))
        ));
    }
}
