use std::path::Path;

use coronagraph_config::{
    dm::DeformableMirror, focal_plane::MAX_N_OUT, Builder, Config, ConfigBuilder, ConfigError, Coronagraph, Fidelity,
    FromBuilder, Plane, ResourceError, Settings, ValidationError,
};
use fitsio::{
    images::{ImageDescription, ImageType},
    FitsFile,
};
use nalgebra::DMatrix;
use proptest::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_flat_map(path: &Path, n: usize, data: &[f64]) -> anyhow::Result<()> {
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[n, n],
    };
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()?;
    let hdu = fptr.primary_hdu()?;
    hdu.write_image(&mut fptr, data)?;
    Ok(())
}

#[test]
fn exact_grid_search() -> anyhow::Result<()> {
    init();
    let config = Config::builder()
        .set("estimator.kind", "exact")
        .set("controller.kind", "grid-search-EFC")
        .set("dm1.n_actuator", 64)
        .build()?;
    assert_eq!(config.dm1().gain.shape(), (64, 64));
    assert_eq!(config.full_nout(), 182);
    assert_eq!(config.full_narr(), 512);
    assert_eq!(config.full_pupil_diam_pix(), 434);
    assert!((config.final_sampling() - 1. / 3.).abs() < 1e-12);
    assert_eq!(config.controller().n_itr(), 5);
    assert!(!config.is_experimental());
    assert_eq!(config.dm1_flat_map(), &DMatrix::<f64>::zeros(64, 64));
    Ok(())
}

#[test]
fn wrong_gain_shape() {
    init();
    let gain = vec![vec![1e-9; 32]; 32];
    let err = Config::builder()
        .set("dm1.n_actuator", 64)
        .set("dm1.gain", gain)
        .build()
        .unwrap_err();
    match err.validation() {
        Some(ValidationError::Shape {
            field,
            expected,
            found,
        }) => {
            assert_eq!(field, "dm1.gain");
            assert_eq!(*expected, (64, 64));
            assert_eq!(*found, (32, 32));
        }
        other => panic!("expected a shape error, found {other:?}"),
    }
}

#[test]
fn missing_flat_map() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let err = Config::builder()
        .set("full.map_dir", dir.path().to_string_lossy().as_ref())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Resource(ResourceError::Missing(_))
    ));
    Ok(())
}

#[test]
fn flat_map() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let n = 32;
    let data: Vec<f64> = (0..n * n).map(|i| i as f64 * 1e-9).collect();
    write_flat_map(&dir.path().join("dm1_flat.fits"), n, &data)?;
    let config = Config::builder()
        .dm1(DeformableMirror::default().n_actuator(n))
        .map_dir(dir.path())
        .set("full.dm1_flat_map", "dm1_flat.fits")
        .build()?;
    assert_eq!(config.dm1_flat_map().shape(), (n, n));
    assert_eq!(config.dm1_flat_map()[(1, 0)], n as f64 * 1e-9);
    assert_eq!(config.dm2_flat_map(), &DMatrix::<f64>::zeros(64, 64));

    let err = Config::builder()
        .map_dir(dir.path())
        .set("full.dm1_flat_map", "dm1_flat.fits")
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Resource(ResourceError::Shape { .. })
    ));
    Ok(())
}

#[test]
fn unknown_estimator() {
    init();
    let err = Config::builder()
        .set("estimator.kind", "kalman")
        .build()
        .unwrap_err();
    let err = err.validation().unwrap();
    assert!(matches!(err, ValidationError::Invalid { .. }));
    assert_eq!(err.field(), "estimator.kind");
}

#[test]
fn experimental_estimator() -> anyhow::Result<()> {
    init();
    let config = Config::builder().set("estimator.kind", "pwp-kf").build()?;
    assert!(config.estimator().is_experimental());
    assert!(config.is_experimental());
    Ok(())
}

#[test]
fn iterated_kalman_estimator() -> anyhow::Result<()> {
    init();
    for kind in ["pwp-iekf", "pairwise-probing-iekf"] {
        let config = Config::builder().set("estimator.kind", kind).build()?;
        assert!(config.estimator().is_experimental(), "{kind}");
        assert!(config.is_experimental(), "{kind}");
    }
    Ok(())
}

#[test]
fn unbounded_resolution() {
    init();
    for resolution in [f64::INFINITY, f64::NAN, 1e300] {
        let err = Config::builder()
            .set("fend.resolution", resolution)
            .build()
            .unwrap_err();
        assert_eq!(
            err.validation().map(|err| err.field()),
            Some("fend.resolution"),
            "{resolution}"
        );
    }
}

#[test]
fn non_finite_settings() {
    init();
    for path in [
        "bandpass.wavelength",
        "dm2.pitch",
        "dm1.x_tilt",
        "p1.diameter",
        "estimator.probe.x_offset",
        "optics.p2_to_dm1",
    ] {
        let err = Config::builder()
            .set(path, f64::INFINITY)
            .build()
            .unwrap_err();
        assert_eq!(err.validation().map(|err| err.field()), Some(path));
    }
}

#[test]
fn lyot_stop_sampling() -> anyhow::Result<()> {
    init();
    let err = Config::builder()
        .set("p4.n_beam.compact", 200)
        .build()
        .unwrap_err();
    assert_eq!(err.validation().unwrap().field(), "p4.n_beam.compact");

    let config = Config::builder()
        .set("p4.n_beam.compact", 200)
        .coronagraph(Coronagraph::Lyot)
        .build()?;
    assert_eq!(config.n_beam(Plane::P4, Fidelity::Compact), Some(200));
    assert_eq!(config.n_beam(Plane::P1, Fidelity::Compact), Some(248));
    Ok(())
}

#[test]
fn override_round_trip() -> anyhow::Result<()> {
    init();
    let overrides: [(&str, toml::Value); 8] = [
        ("bandpass.wavelength", toml::Value::Float(650e-9)),
        ("bandpass.n_subband", toml::Value::Integer(3)),
        ("estimator.probe.axis", toml::Value::String("y".into())),
        ("controller.dm_ind", toml::Value::Array(vec![toml::Value::Integer(1)])),
        ("dm2.pitch", toml::Value::Float(300e-6)),
        ("optics.coronagraph", toml::Value::String("apodized-vortex".into())),
        ("fend.half_fov", toml::Value::Integer(20)),
        ("vortex.charge", toml::Value::Integer(4)),
    ];
    let builder = overrides
        .iter()
        .fold(Config::builder(), |builder, (path, value)| {
            builder.set(path, value.clone())
        });
    let config = builder.build()?;
    for (path, value) in overrides {
        let read = config
            .value(path)
            .ok_or_else(|| anyhow::anyhow!("{path} not found"))?;
        match (&read, &value) {
            (toml::Value::Float(read), toml::Value::Integer(value)) => {
                assert_eq!(*read, *value as f64, "{path}")
            }
            _ => assert_eq!(read, value, "{path}"),
        }
    }
    assert_eq!(config.full_nout(), 122);
    Ok(())
}

#[test]
fn defaults() -> anyhow::Result<()> {
    init();
    let config = Config::builder().build()?;
    assert_eq!(config.settings(), &Settings::default());
    assert_eq!(config.dm2().iris.diameter, 50e-3);
    assert_eq!(config.field_stop_radius(), 26.);
    assert_eq!(config.norm_lyot_diam(), 0.95);
    assert_eq!(config.vortex_charge(), 6);
    assert_eq!(config.dm(3), None);
    Ok(())
}

#[test]
fn unknown_key() {
    init();
    let err = Config::builder()
        .set("evaluation.throughput.radii", 0.7)
        .build()
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::Unknown(
            "evaluation.throughput.radii".into()
        ))
    );
}

#[test]
fn save_and_load() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    let builder = Config::builder()
        .set("estimator.kind", "pwp-bp")
        .set("controller.kind", "planned-EFC")
        .set("series", 1);
    builder.save(&path)?;
    let toml = std::fs::read_to_string(&path)?;
    assert!(toml.starts_with("# ::coronagraph_config::Config"));
    let config = ConfigBuilder::load(&path)?.build()?;
    assert_eq!(config, builder.build()?);
    assert_eq!(config.settings().series, 1);
    assert_eq!(config.controller().kind.name(), "planned-EFC");
    Ok(())
}

#[test]
fn partial_file() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[dm1]
influence = "BMC-2K"

[fend.correction]
outer_radius = 12.0
"#,
    )?;
    let config = ConfigBuilder::load(&path)?.build()?;
    assert_eq!(
        config.dm1().influence.file_name(),
        "influence_BMC_2kDM_400micron_res10.fits"
    );
    assert_eq!(config.field_stop_radius(), 12.);
    Ok(())
}

#[test]
fn rerun() -> anyhow::Result<()> {
    init();
    let config = Config::builder().set("trial", 1).build()?;
    let rerun = ConfigBuilder::from(&config).set("trial", 2).build()?;
    assert_eq!(config.settings().trial, 1);
    assert_eq!(rerun.settings().trial, 2);
    assert_eq!(rerun.dm1(), config.dm1());
    Ok(())
}

#[test]
fn shared_across_threads() -> anyhow::Result<()> {
    fn is_send_sync<T: Send + Sync>(_: &T) {}
    let config = Config::builder().build()?;
    is_send_sync(&config);
    let n_out = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4).map(|_| s.spawn(|| config.full_nout())).collect();
        workers
            .into_iter()
            .map(|w| w.join().unwrap_or_default())
            .collect::<Vec<_>>()
    });
    assert_eq!(n_out, vec![182; 4]);
    Ok(())
}

proptest! {
    #[test]
    fn output_size(resolution in 1f64..10., half_fov in 6f64..50.) {
        let config = Config::builder()
            .set("fend.resolution", resolution)
            .set("fend.half_fov", half_fov)
            .set("fend.correction.outer_radius", half_fov / 2.)
            .set("fend.scoring.outer_radius", half_fov / 2.)
            .build()
            .unwrap();
        let n_out = config.full_nout();
        let min = 1. + 2. * resolution * half_fov;
        prop_assert_eq!(n_out % 2, 0);
        prop_assert!(n_out as f64 >= min);
        prop_assert!((n_out as f64) < min + 2.);
    }

    #[test]
    fn output_size_bound(resolution in 1f64..1e3, half_fov in 6f64..1e3) {
        let result = Config::builder()
            .set("fend.resolution", resolution)
            .set("fend.half_fov", half_fov)
            .set("fend.correction.outer_radius", half_fov / 2.)
            .set("fend.scoring.outer_radius", half_fov / 2.)
            .build();
        let min = 1. + 2. * resolution * half_fov;
        match result {
            Ok(config) => {
                let n_out = config.full_nout();
                prop_assert!(n_out <= MAX_N_OUT);
                prop_assert_eq!(n_out % 2, 0);
                prop_assert!(n_out as f64 >= min);
            }
            Err(err) => {
                prop_assert!(min > MAX_N_OUT as f64);
                prop_assert_eq!(err.validation().map(|err| err.field()), Some("fend.resolution"));
            }
        }
    }

    #[test]
    fn angle_conversion(mas in 1f64..1e3) {
        let config = Config::builder().build().unwrap();
        let back = config.lambda0_d_to_mas(config.mas_to_lambda0_d(mas));
        prop_assert!((back - mas).abs() < 1e-9 * mas);
    }
}
