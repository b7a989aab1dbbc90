use bevy::{
    pbr::wireframe::{WireframeConfig, WireframePlugin},
    prelude::*,
};
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_metaballs::{MetaballConfig, MetaballPlugin, MetaballSurface};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

/// Marks a ball that drifts back and forth along X.
#[derive(Component)]
struct Drift {
    home: Vec3,
    phase: f32,
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            MetaballPlugin {
                parallel: true,
                ..Default::default()
            },
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
            WireframePlugin::default(),
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, (drift, controls, debug))
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    bevy::log::info!("Metaballs Example: [Up]/[Down] change steps, [W] toggles wireframe");

    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 100.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0., 4., 9.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let marker = meshes.add(Sphere::new(0.05));
    let marker_material = materials.add(Color::WHITE);
    let balls: Vec<Entity> = [-2., 0., 2.]
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            let home = Vec3::new(x, 1.5, 0.);
            commands
                .spawn((
                    Drift {
                        home,
                        phase: i as f32 * 2.1,
                    },
                    Transform::from_translation(home),
                    Mesh3d(marker.clone()),
                    MeshMaterial3d(marker_material.clone()),
                ))
                .id()
        })
        .collect();

    commands.spawn((
        MetaballSurface::new(balls, 1.0),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.5, 1.),
            perceptual_roughness: 0.3,
            ..Default::default()
        })),
    ));
}

fn drift(time: Res<Time>, mut balls: Query<(&Drift, &mut Transform)>) {
    let t = time.elapsed_secs();
    for (drift, mut transform) in balls.iter_mut() {
        transform.translation = drift.home + Vec3::X * (t * 0.8 + drift.phase).sin() * 0.9;
    }
}

fn controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<MetaballConfig>,
    mut wireframe: ResMut<WireframeConfig>,
) {
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        config.steps += 5;
        bevy::log::info!(steps = config.steps, "finer grid");
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) && config.steps > 5 {
        config.steps -= 5;
        bevy::log::info!(steps = config.steps, "coarser grid");
    }
    if keyboard.just_pressed(KeyCode::KeyW) {
        wireframe.global = !wireframe.global;
    }
}

fn debug(mut gizmos: Gizmos, query: Query<&GlobalTransform, With<MetaballSurface>>) {
    for transform in query.iter() {
        gizmos.line(
            transform.translation(),
            transform.translation() + Vec3::X * 2.0,
            Color::Srgba(Srgba::new(1., 0., 0., 1.)),
        );
        gizmos.line(
            transform.translation(),
            transform.translation() + Vec3::Z * 2.0,
            Color::Srgba(Srgba::new(0., 0., 1., 1.)),
        );
    }
}
