/// Gray used for both the frame clear and the fog the lit pass blends into.
pub(crate) const BACKGROUND_GRAY: f32 = 0.7;

/// Per-draw uniform block shared by every pipeline. Must match
/// `ShaderUniforms` byte for byte.
const UNIFORMS: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_space: mat4x4<f32>,
    normal_matrix: mat3x3<f32>,
    light_dir_matrix: mat3x3<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    point_light_pos: vec4<f32>,
    fog_density: f32,
    point_light_enabled: i32,
    shadow_unit: i32,
    _pad: f32,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;
"#;

/// Depth-only pass from the light.
const DEPTH_BODY: &str = r#"
@vertex
fn vs_depth(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.light_space * u.model * vec4<f32>(position, 1.0);
}
"#;

/// Directional light with shadow lookup, optional point light and
/// exponential-squared fog. Lighting is done in eye space.
const LIT_BODY: &str = r#"
@group(1) @binding(0)
var shadow_map: texture_depth_2d;
@group(1) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) eye_pos: vec3<f32>,
    @location(1) eye_normal: vec3<f32>,
    @location(2) light_pos: vec4<f32>,
    @location(3) color: vec3<f32>,
};

@vertex
fn vs_lit(vertex: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(vertex.position, 1.0);
    let eye = u.view * world;

    var out: VertexOutput;
    out.clip_position = u.projection * eye;
    out.eye_pos = eye.xyz;
    out.eye_normal = normalize(u.normal_matrix * vertex.normal);
    out.light_pos = u.light_space * world;
    out.color = vertex.color;
    return out;
}

fn shadow_factor(light_pos: vec4<f32>, bias: f32) -> f32 {
    let ndc = light_pos.xyz / light_pos.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);
    let visible = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, ndc.z - bias);
    let outside = any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0;
    return select(visible, 1.0, outside);
}

@fragment
fn fs_lit(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.eye_normal);
    let light_dir = normalize(u.light_dir_matrix * u.light_dir.xyz);
    let view_dir = normalize(-in.eye_pos);

    let ambient = 0.2 * u.light_color.rgb;
    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let diffuse = n_dot_l * u.light_color.rgb;
    let half_dir = normalize(light_dir + view_dir);
    let specular = 0.5 * pow(max(dot(normal, half_dir), 0.0), 32.0) * u.light_color.rgb;

    let bias = max(0.005 * (1.0 - n_dot_l), 0.0005);
    let lit = shadow_factor(in.light_pos, bias);

    var color = (ambient + lit * (diffuse + specular)) * in.color;

    if u.point_light_enabled != 0 {
        let eye_light = (u.view * vec4<f32>(u.point_light_pos.xyz, 1.0)).xyz;
        let to_point = normalize(eye_light - in.eye_pos);
        color += max(dot(normal, to_point), 0.0) * u.light_color.rgb * in.color;
    }

    let distance = length(in.eye_pos);
    let fog = clamp(exp(-pow(distance * u.fog_density, 2.0)), 0.0, 1.0);
    let fog_color = vec3<f32>(BACKGROUND_GRAY);
    return vec4<f32>(mix(fog_color, color, fog), 1.0);
}
"#;

/// Flat white marker at the light position.
const MARKER_BODY: &str = r#"
@vertex
fn vs_marker(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.projection * u.view * u.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_marker() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

/// Procedural sky gradient. `view` has no translation; z is forced to the
/// far plane so the sky sits behind everything.
const SKYBOX_BODY: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_skybox(@location(0) position: vec3<f32>) -> SkyOutput {
    let clip = u.projection * u.view * vec4<f32>(position, 1.0);
    var out: SkyOutput;
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_skybox(in: SkyOutput) -> @location(0) vec4<f32> {
    let t = clamp(normalize(in.direction).y * 0.5 + 0.5, 0.0, 1.0);
    let horizon = vec3<f32>(0.75, 0.8, 0.85);
    let zenith = vec3<f32>(0.25, 0.45, 0.8);
    return vec4<f32>(mix(horizon, zenith, t), 1.0);
}
"#;

pub fn depth_shader() -> String {
    [UNIFORMS, DEPTH_BODY].concat()
}

pub fn lit_shader() -> String {
    let background = format!("const BACKGROUND_GRAY: f32 = {BACKGROUND_GRAY:?};\n");
    [UNIFORMS, &background, LIT_BODY].concat()
}

pub fn marker_shader() -> String {
    [UNIFORMS, MARKER_BODY].concat()
}

pub fn skybox_shader() -> String {
    [UNIFORMS, SKYBOX_BODY].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_declares_the_shared_block() {
        for source in [depth_shader(), lit_shader(), marker_shader(), skybox_shader()] {
            assert!(source.contains("var<uniform> u: Uniforms"));
        }
    }

    #[test]
    fn fog_blends_into_background_gray() {
        let source = lit_shader();
        assert!(source.contains("const BACKGROUND_GRAY: f32 = 0.7;"));
        assert!(source.contains("vec3<f32>(BACKGROUND_GRAY)"));
    }

    #[test]
    fn entry_points_exist() {
        assert!(depth_shader().contains("fn vs_depth"));
        assert!(lit_shader().contains("fn vs_lit"));
        assert!(lit_shader().contains("fn fs_lit"));
        assert!(marker_shader().contains("fn fs_marker"));
        assert!(skybox_shader().contains("fn fs_skybox"));
    }
}
