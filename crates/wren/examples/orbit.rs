//! A sun/planet/moon hierarchy driven entirely by local rotations.
//!
//! The planet orbits because its *pivot parent* spins; the moon orbits the
//! planet the same way one level down. A console backend prints where each
//! body ends up every frame, and a watchdog system stops the loop after a
//! fixed number of frames so the example terminates on its own.
//!
//! Run with `RUST_LOG=info cargo run -p wren --example orbit`.

use wren::prelude::*;

/// Spins its node around the Y axis at a fixed rate.
struct Spin {
    radians_per_sec: f32,
}

impl Component for Spin {
    fn on_update(&mut self, scene: &mut Scene, node: NodeId, dt: f32) {
        let delta = Quat::from_rotation_y(self.radians_per_sec * dt);
        scene.rotate(node, delta, Space::Local);
    }
}

/// Prints the frame's draw calls instead of touching a GPU.
struct ConsoleBackend;

impl RenderBackend for ConsoleBackend {
    fn draw(&mut self, frame: &RenderFrame) -> bool {
        for draw in &frame.draws {
            let position = draw.model.transform_point3(Vec3::ZERO);
            log::info!(
                "mesh {:?} at ({:+.2}, {:+.2}, {:+.2})",
                draw.mesh,
                position.x,
                position.y,
                position.z
            );
        }
        true
    }
}

/// Stops the loop after a fixed number of frames.
struct FrameLimit(u64);

impl System for FrameLimit {
    fn on_update(&mut self, ctx: &mut Context, _dt: f32) -> bool {
        ctx.time.frame_count() < self.0
    }
}

struct Orbit;

impl Game for Orbit {
    fn on_init(&mut self, app: &mut App) {
        let scene = &mut app.ctx.scene;
        let root = scene.root();

        let sun = scene.add_child(root).unwrap();
        scene.add_component(sun, MeshRenderer::new(MeshHandle(0), MaterialHandle(0)));

        // The pivot spins; the planet hangs off it at a fixed radius.
        let planet_pivot = scene.add_child(sun).unwrap();
        scene.add_component(
            planet_pivot,
            Spin {
                radians_per_sec: 0.5,
            },
        );
        let planet = scene.add_child(planet_pivot).unwrap();
        scene.set_local_position(planet, Vec3::new(8.0, 0.0, 0.0));
        scene.add_component(planet, MeshRenderer::new(MeshHandle(1), MaterialHandle(0)));

        let moon_pivot = scene.add_child(planet).unwrap();
        scene.add_component(
            moon_pivot,
            Spin {
                radians_per_sec: 2.0,
            },
        );
        let moon = scene.add_child(moon_pivot).unwrap();
        scene.set_local_position(moon, Vec3::new(2.0, 0.0, 0.0));
        scene.add_component(moon, MeshRenderer::new(MeshHandle(2), MaterialHandle(0)));

        let camera = scene.add_child(root).unwrap();
        scene.set_local_position(camera, Vec3::new(0.0, 12.0, 24.0));
        scene.add_component(camera, Camera::perspective(60.0));
        app.ctx.active_camera = Some(camera);

        app.add_system(RenderSystem::new(ConsoleBackend));
        app.add_system(FrameLimit(240));
    }

    fn on_exit(&mut self, app: &mut App) {
        log::info!(
            "done after {} frames ({:.1}s)",
            app.ctx.time.frame_count(),
            app.ctx.time.elapsed_secs()
        );
    }
}

fn main() {
    env_logger::init();
    App::new().run(&mut Orbit);
}
