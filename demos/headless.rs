use std::time::Duration;

use glam::{Mat4, Vec3, Vec4};
use shaderlab::prelude::*;

/// Headless ShaderLab Example
///
/// Writes a small shader project to a temp directory, builds a pipeline of
/// two passes and renders a few frames offscreen. Halfway through, the
/// shader file is broken and recompiled to show diagnostics, then fixed.
const SHADER: &str = r"
struct VsUniforms {
    model: mat4x4<f32>,
    view_projection: mat4x4<f32>,
}

struct PsUniforms {
    color: vec4<f32>,
    time: f32,
}

@group(0) @binding(0) var<uniform> vs: VsUniforms;
@group(1) @binding(0) var<uniform> ps: PsUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.position = vs.view_projection * vs.model * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let pulse = 0.5 + 0.5 * sin(ps.time * 3.0);
    return vec4<f32>(ps.color.rgb * pulse * in.uv.x, ps.color.a);
}
";

fn vertex_slots() -> VariableSlots {
    let mut slots = VariableSlots::new();
    let buffer = ConstantBuffer::new()
        .with(ShaderVariable::system("model", SystemSemantic::GeometryTransform))
        .with(ShaderVariable::system("view_projection", SystemSemantic::ViewProjection));
    slots.set_slot(0, buffer).expect("slot 0 is in range");
    slots
}

fn pixel_slots(color: Vec4) -> VariableSlots {
    let mut slots = VariableSlots::new();
    let buffer = ConstantBuffer::new()
        .with(ShaderVariable::new("color", VariableValue::Float4(color)))
        .with(ShaderVariable::system("time", SystemSemantic::Time));
    slots.set_slot(0, buffer).expect("slot 0 is in range");
    slots
}

fn lit_pass(color: Vec4) -> ShaderPass {
    ShaderPass::new("shaders/pulse.wgsl", "vs_main", "shaders/pulse.wgsl", "fs_main")
        .with_input_layout(InputLayout::position_normal_texcoord())
        .with_vs_variables(vertex_slots())
        .with_ps_variables(pixel_slots(color))
}

fn main() -> shaderlab::Result<()> {
    env_logger::init();

    let project = ProjectDirectory::new(std::env::temp_dir().join("shaderlab-headless"));
    project.save_project_file("shaders/pulse.wgsl", SHADER)?;

    // 1. Build the pipeline list
    let mut pipeline = PipelineManager::new();
    let background = pipeline.add_pass("Background", lit_pass(Vec4::new(0.2, 0.3, 0.8, 1.0)));
    let floor = GeometryItem::new(create_plane(4.0, 4.0)).at(Vec3::new(0.0, -1.0, 0.0));
    pipeline.add_child(background, "Floor", ItemKind::Geometry(floor))?;

    let foreground = pipeline.add_pass("Foreground", lit_pass(Vec4::new(1.0, 0.5, 0.1, 1.0)));
    pipeline.add_child(
        foreground,
        "Blend",
        ItemKind::BlendState(BlendState {
            state: shaderlab::pipeline::BlendStateDesc::alpha_blending(),
        }),
    )?;
    pipeline.add_child(
        foreground,
        "Cube",
        ItemKind::Geometry(GeometryItem::new(create_cube(1.0, 1.0, 1.0))),
    )?;

    // 2. Create the engine on a headless device
    let backend = WgpuBackend::new(&WgpuSettings::default())?;
    let mut engine = RenderEngine::new(backend, EngineSettings::default());

    let mut messages = MessageStack::new();
    let mut system = SystemVariables::new();
    let (width, height) = (640, 480);
    let aspect = width as f32 / height as f32;
    let projection = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(3.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y);
    system.set_camera(view, projection);

    // 3. Render a few frames, breaking and fixing the shader on the way
    for frame in 0..6 {
        system.tick(1.0 / 60.0);

        if frame == 2 {
            project.save_project_file("shaders/pulse.wgsl", "fn vs_main( {")?;
            let mut ctx = FrameContext::new(&pipeline, &project, &mut messages, &mut system);
            engine.recompile(&mut ctx, "Foreground");
        }
        if frame == 4 {
            project.save_project_file("shaders/pulse.wgsl", SHADER)?;
            let mut ctx = FrameContext::new(&pipeline, &project, &mut messages, &mut system);
            engine.recompile(&mut ctx, "Foreground");
        }

        let mut ctx = FrameContext::new(&pipeline, &project, &mut messages, &mut system);
        let stats = engine.render(&mut ctx, width, height)?;
        println!(
            "frame {frame}: {} passes, {} draws, {} state changes, {} diagnostics",
            stats.passes,
            stats.draws,
            stats.state_changes,
            messages.messages().len()
        );
        std::thread::sleep(Duration::from_millis(16));
    }

    println!(
        "{} pipelines cached after {} frames",
        engine.backend().pipeline_count(),
        engine.backend().frame_index()
    );
    Ok(())
}
