use std::time::Instant;

use tokio::runtime::Handle;

use crate::engine::components::camera::OrbitCamera;
use crate::engine::components::mesh_object::{ MeshObject, SceneObject };
use crate::engine::components::simple_mesh_object::SimpleMeshObject;
use crate::engine::config::ViewerConfig;
use crate::engine::error::RenderResult;
use crate::engine::rendering::context::RendererContext;
use crate::engine::rendering::device::RenderDevice;
use crate::engine::rendering::frame::Frame;
use crate::engine::rendering::program::ShaderProgram;
use crate::engine::scene::Scene;
use crate::engine::systems::frame_driver::{ FrameAction, FrameDriver, Zoom };

/// Everything needed to draw one model: the device, shared renderer state,
/// the negotiated program, the scene, its camera and the input driver.
pub struct Viewer<D: RenderDevice> {
    device: D,
    context: RendererContext<D>,
    program: ShaderProgram<D>,
    scene: Scene<D>,
    camera: OrbitCamera,
    driver: FrameDriver,
}

impl<D: RenderDevice + 'static> Viewer<D> {
    /// Compiles the program, loads the configured model (or the textured
    /// quad when none is set) and places the lights. Texture loads are
    /// started on `runtime` and finish in later frames.
    pub fn new(device: D, config: &ViewerConfig, runtime: Handle) -> RenderResult<Self> {
        let program = ShaderProgram::from_files(
            &device,
            config.shaders.vertex.as_deref(),
            config.shaders.fragment.as_deref()
        )?;
        let mut context = RendererContext::new(&device, runtime)?;

        let object: Box<dyn SceneObject<D>> = match &config.model {
            Some(path) => Box::new(MeshObject::load(&device, &mut context, path, config.draw_mode)?),
            None => {
                log::info!("no model configured; showing a textured quad");
                Box::new(SimpleMeshObject::textured_quad(&device, &mut context, config.quad_texture.clone()))
            }
        };

        let mut scene = Scene::new();
        scene.add_object(object);

        let center_y = if scene.bounds().is_empty() { 0.0 } else { scene.bounds().center()[1] };
        for light in &config.lights {
            scene.add_light(light.build(center_y));
        }

        let driver = FrameDriver::new(&config.camera);
        let camera = OrbitCamera::new(driver.radius(), config.camera.fov_degrees);

        log::info!(
            "viewer ready: {} object(s), {} light(s), {} texture load(s) pending",
            scene.len(),
            scene.lights().len(),
            context.textures.pending()
        );

        Ok(Self {
            device,
            context,
            program,
            scene,
            camera,
            driver,
        })
    }

    /// Runs one tick of the render loop against a `width` × `height`
    /// framebuffer. Finished texture loads are uploaded first; nothing is
    /// drawn until none are pending.
    pub fn frame(&mut self, now: Instant, width: u32, height: u32) -> FrameAction {
        self.context.textures.poll(&self.device);

        let action = self.driver.tick(now, self.context.resources_ready());
        if let FrameAction::Render { .. } = action {
            self.camera.set_radius(self.driver.radius());
            self.camera.set_viewport(width, height);
            self.camera.update();

            self.device.begin_frame(self.program.program(), width, height);
            let frame = Frame {
                device: &self.device,
                context: &self.context,
                bindings: &self.program.bindings,
                view: self.camera.view(),
                projection: self.camera.projection(),
            };
            self.scene.draw(&frame, &self.camera);
        }
        action
    }

    /// Resolves once every texture load started so far has finished.
    pub async fn wait_until_loaded(&mut self) {
        self.context.textures.wait_until_loaded(&self.device).await;
    }

    pub fn toggle_animation(&mut self) -> bool {
        self.driver.toggle_animation()
    }

    pub fn set_zoom(&mut self, zoom: Zoom, held: bool) {
        self.driver.set_zoom(zoom, held);
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.driver.begin_drag(x, y);
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some(angles) = self.driver.drag_to(x, y) {
            self.scene.mouse_rotate(angles);
        }
    }

    pub fn end_drag(&mut self) {
        self.driver.end_drag();
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn scene(&self) -> &Scene<D> {
        &self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Releases every GPU object the viewer created. The device is handed
    /// back so the caller can tear down the context.
    pub fn shutdown(mut self) -> D {
        self.scene.clear(&self.device);
        self.context.release(&self.device);
        self.program.release(&self.device);
        log::info!("viewer resources released");
        self.device
    }
}
