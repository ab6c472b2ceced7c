use std::fmt;

use glow::HasContext;
use serde::Deserialize;

use crate::engine::error::{ RenderError, RenderResult };

/// One entry of a linked program's active uniform or attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveResource {
    pub name: String,
    pub size: i32,
}

/// GPU-side shape of a uniform, which decides the upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Int,
    Sampler,
}

impl UniformKind {
    /// Floats per element; zero for integer kinds.
    pub fn components(self) -> usize {
        match self {
            UniformKind::Float => 1,
            UniformKind::Vec2 => 2,
            UniformKind::Vec3 => 3,
            UniformKind::Vec4 => 4,
            UniformKind::Mat3 => 9,
            UniformKind::Mat4 => 16,
            UniformKind::Int | UniformKind::Sampler => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

impl DrawMode {
    fn gl_mode(self) -> u32 {
        match self {
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
            DrawMode::Lines => glow::LINES,
            DrawMode::Points => glow::POINTS,
        }
    }
}

/// Everything the renderer asks of the GPU.
///
/// Handle types are associated so the scene code never names a backend;
/// `GlDevice` is the real one, tests use a recording double.
pub trait RenderDevice {
    type Buffer: Copy + fmt::Debug + PartialEq;
    type Texture: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn compile_program(&self, vertex_src: &str, fragment_src: &str) -> RenderResult<Self::Program>;
    fn delete_program(&self, program: Self::Program);
    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveResource>;
    fn active_attributes(&self, program: Self::Program) -> Vec<ActiveResource>;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn create_array_buffer(&self, data: &[f32]) -> RenderResult<Self::Buffer>;
    fn create_index_buffer(&self, data: &[u32]) -> RenderResult<Self::Buffer>;
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_texture(&self) -> RenderResult<Self::Texture>;
    /// Fills a texture with a single mipmapped RGBA texel.
    fn upload_solid_texture(&self, texture: Self::Texture, rgba: [u8; 4]);
    /// Uploads RGBA8 pixels, sets repeat wrapping and trilinear filtering
    /// and generates mipmaps.
    fn upload_texture_image(&self, texture: Self::Texture, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: Self::Texture);

    fn set_uniform_floats(&self, location: &Self::UniformLocation, kind: UniformKind, data: &[f32]);
    fn set_uniform_int(&self, location: &Self::UniformLocation, value: i32);
    fn bind_texture_unit(&self, unit: u32, texture: Self::Texture, location: &Self::UniformLocation);
    /// `None` disables the attribute array so meshes may lack a channel.
    fn bind_attribute(&self, location: u32, components: i32, buffer: Option<Self::Buffer>);

    fn begin_frame(&self, program: Self::Program, width: u32, height: u32);
    fn draw(&self, mode: DrawMode, count: usize, index_buffer: Option<Self::Buffer>);
}

/// OpenGL 3.3 core device over `glow`.
pub struct GlDevice {
    gl: glow::Context,
    vao: glow::VertexArray,
}

impl GlDevice {
    pub fn new(gl: glow::Context) -> RenderResult<Self> {
        unsafe {
            // Core profiles refuse attribute pointers without a bound VAO.
            let vao = gl.create_vertex_array().map_err(RenderError::Allocation)?;
            gl.bind_vertex_array(Some(vao));
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);
            Ok(Self { gl, vao })
        }
    }

    pub fn cleanup(&self) {
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.delete_vertex_array(self.vao);
        }
    }

    fn compile_shader(&self, shader_type: u32, stage: &'static str, source: &str) -> RenderResult<glow::Shader> {
        unsafe {
            let shader = self.gl.create_shader(shader_type).map_err(RenderError::Allocation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }
}

impl RenderDevice for GlDevice {
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn compile_program(&self, vertex_src: &str, fragment_src: &str) -> RenderResult<glow::Program> {
        let vs = self.compile_shader(glow::VERTEX_SHADER, "vertex", vertex_src)?;
        let fs = match self.compile_shader(glow::FRAGMENT_SHADER, "fragment", fragment_src) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe { self.gl.delete_shader(vs) };
                return Err(e);
            }
        };

        unsafe {
            let program = self.gl.create_program().map_err(RenderError::Allocation)?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::ProgramLink(log));
            }

            log::info!("shader program linked");
            Ok(program)
        }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn active_uniforms(&self, program: glow::Program) -> Vec<ActiveResource> {
        unsafe {
            (0..self.gl.get_active_uniforms(program))
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .map(|u| ActiveResource { name: u.name, size: u.size })
                .collect()
        }
    }

    fn active_attributes(&self, program: glow::Program) -> Vec<ActiveResource> {
        unsafe {
            (0..self.gl.get_active_attributes(program))
                .filter_map(|index| self.gl.get_active_attribute(program, index))
                .map(|a| ActiveResource { name: a.name, size: a.size })
                .collect()
        }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attribute_location(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn create_array_buffer(&self, data: &[f32]) -> RenderResult<glow::Buffer> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(RenderError::Allocation)?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(data), glow::STATIC_DRAW);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            Ok(buffer)
        }
    }

    fn create_index_buffer(&self, data: &[u32]) -> RenderResult<glow::Buffer> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(RenderError::Allocation)?;
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW
            );
            Ok(buffer)
        }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn create_texture(&self) -> RenderResult<glow::Texture> {
        unsafe { self.gl.create_texture().map_err(RenderError::Allocation) }
    }

    fn upload_solid_texture(&self, texture: glow::Texture, rgba: [u8; 4]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                1,
                1,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&rgba))
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn upload_texture_image(&self, texture: glow::Texture, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels))
            );
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32
            );
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn set_uniform_floats(&self, location: &glow::UniformLocation, kind: UniformKind, data: &[f32]) {
        let loc = Some(location);
        unsafe {
            match kind {
                UniformKind::Float => self.gl.uniform_1_f32_slice(loc, data),
                UniformKind::Vec2 => self.gl.uniform_2_f32_slice(loc, data),
                UniformKind::Vec3 => self.gl.uniform_3_f32_slice(loc, data),
                UniformKind::Vec4 => self.gl.uniform_4_f32_slice(loc, data),
                UniformKind::Mat3 => self.gl.uniform_matrix_3_f32_slice(loc, true, data),
                UniformKind::Mat4 => self.gl.uniform_matrix_4_f32_slice(loc, true, data),
                UniformKind::Int | UniformKind::Sampler => {
                    log::error!("float data sent to an integer uniform ({:?})", kind);
                }
            }
        }
    }

    fn set_uniform_int(&self, location: &glow::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn bind_texture_unit(&self, unit: u32, texture: glow::Texture, location: &glow::UniformLocation) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.uniform_1_i32(Some(location), unit as i32);
        }
    }

    fn bind_attribute(&self, location: u32, components: i32, buffer: Option<glow::Buffer>) {
        unsafe {
            match buffer {
                Some(buffer) => {
                    self.gl.enable_vertex_attrib_array(location);
                    self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                    self.gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
                }
                None => self.gl.disable_vertex_attrib_array(location),
            }
        }
    }

    fn begin_frame(&self, program: glow::Program, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            self.gl.use_program(Some(program));
        }
    }

    fn draw(&self, mode: DrawMode, count: usize, index_buffer: Option<glow::Buffer>) {
        unsafe {
            match index_buffer {
                Some(indices) => {
                    self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
                    self.gl.draw_elements(mode.gl_mode(), count as i32, glow::UNSIGNED_INT, 0);
                }
                None => self.gl.draw_arrays(mode.gl_mode(), 0, count as i32),
            }
        }
    }
}
