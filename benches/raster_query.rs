use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};
use pergola_viewer::math::{ray_triangle, CameraState, PerspectiveProjection, Ray};
use pergola_viewer::scene::RayCaster;
use pergola_viewer::scenes::box_mesh;
use pergola_viewer::traits::SharedInstance;
use pergola_viewer::types::{MeshInstance, Pose, Viewport};

fn camera() -> CameraState {
    CameraState::from_pose(
        Pose::looking_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0)),
        PerspectiveProjection::new(90.0, 16.0 / 9.0, 0.1, 1000.0),
        Viewport::new(1280.0, 720.0),
    )
}

fn boxed_instance(center: Vec3, size: Vec3) -> SharedInstance {
    Rc::new(RefCell::new(MeshInstance::at(
        Rc::new(box_mesh(size)),
        center,
    )))
}

/// Benchmark: Ray/triangle kernel (hit case)
fn bench_ray_triangle_hit(c: &mut Criterion) {
    let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    let v0 = Vec3::new(-1.0, -1.0, -5.0);
    let v1 = Vec3::new(1.0, -1.0, -5.0);
    let v2 = Vec3::new(0.0, 1.0, -5.0);

    c.bench_function("ray_triangle_hit", |b| {
        b.iter(|| {
            black_box(ray_triangle(
                black_box(&ray),
                black_box(v0),
                black_box(v1),
                black_box(v2),
            ))
        })
    });
}

/// Benchmark: Ray/triangle kernel (miss case)
fn bench_ray_triangle_miss(c: &mut Criterion) {
    let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
    let v0 = Vec3::new(5.0, 5.0, -5.0);
    let v1 = Vec3::new(7.0, 5.0, -5.0);
    let v2 = Vec3::new(6.0, 7.0, -5.0);

    c.bench_function("ray_triangle_miss", |b| {
        b.iter(|| {
            black_box(ray_triangle(
                black_box(&ray),
                black_box(v0),
                black_box(v1),
                black_box(v2),
            ))
        })
    });
}

/// Benchmark: World-point projection to raster coordinates
fn bench_world_to_raster(c: &mut Criterion) {
    let camera = camera();
    let in_view = Vec3::new(0.3, 0.5, -4.0);
    let behind = Vec3::new(0.0, 0.0, 3.0);

    c.bench_function("world_to_raster_in_view", |b| {
        b.iter(|| black_box(camera.world_to_raster(black_box(in_view))))
    });
    c.bench_function("world_to_raster_rejected", |b| {
        b.iter(|| black_box(camera.world_to_raster(black_box(behind))))
    });
}

/// Benchmark: Picking ray against a single collision box
fn bench_cast_through_box(c: &mut Criterion) {
    let camera = camera();
    let mut caster = RayCaster::new();
    caster.add("Roof", boxed_instance(Vec3::new(0.0, 0.0, -5.0), Vec3::splat(2.0)));

    let center = Vec2::new(640.0, 360.0);
    let corner = Vec2::new(10.0, 10.0);

    c.bench_function("cast_box_hit", |b| {
        b.iter(|| black_box(caster.cast(black_box(center), black_box(&camera))))
    });
    c.bench_function("cast_box_miss", |b| {
        b.iter(|| black_box(caster.cast(black_box(corner), black_box(&camera))))
    });
}

/// Benchmark: Cast cost against a growing target set
fn bench_cast_scaling(c: &mut Criterion) {
    let camera = camera();
    let mut group = c.benchmark_group("cast_scaling");

    for count in [1usize, 8, 64].iter() {
        let mut caster = RayCaster::new();
        for i in 0..*count {
            // Only the first box sits on the center ray.
            let center = Vec3::new(3.0 * i as f32, 0.0, -5.0);
            caster.add("Scenery", boxed_instance(center, Vec3::splat(2.0)));
        }

        let raster = Vec2::new(640.0, 360.0);
        group.bench_with_input(BenchmarkId::new("boxes", count), count, |b, _| {
            b.iter(|| black_box(caster.cast(black_box(raster), black_box(&camera))))
        });
    }

    group.finish();
}

/// Benchmark: Full per-hotspot visibility query, projection plus occlusion
fn bench_anchor_visibility_query(c: &mut Criterion) {
    let camera = camera();
    let mut caster = RayCaster::new();
    caster.add("Roof", boxed_instance(Vec3::new(-0.1, 0.5, -4.65), Vec3::new(4.75, 0.5, 3.3)));
    let anchor = Vec3::new(-0.15, 0.6, -2.92);

    c.bench_function("anchor_visibility_query", |b| {
        b.iter(|| {
            let visible = camera
                .world_to_raster(black_box(anchor))
                .and_then(|raster| caster.cast(raster, &camera))
                .is_some_and(|hit| {
                    camera.world_to_view(anchor).z <= camera.world_to_view(hit).z
                });
            black_box(visible)
        })
    });
}

criterion_group!(
    benches,
    bench_ray_triangle_hit,
    bench_ray_triangle_miss,
    bench_world_to_raster,
    bench_cast_through_box,
    bench_cast_scaling,
    bench_anchor_visibility_query,
);

criterion_main!(benches);
