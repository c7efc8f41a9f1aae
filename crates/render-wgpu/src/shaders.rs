//! Built-in WGSL sources, one per [`ProgramId`].
//!
//! Each module exposes `vs_main` and (except the depth pass) `fs_main`. The
//! `Uniforms` struct of each must match `ProgramId::uniform_layout`.

use lumi_render::ProgramId;

pub fn builtin(program: ProgramId) -> &'static str {
    match program {
        ProgramId::Lit => LIT_SHADER,
        ProgramId::Unlit => UNLIT_SHADER,
        ProgramId::ShadowDepth => SHADOW_DEPTH_SHADER,
        ProgramId::DepthDebug => DEPTH_DEBUG_SHADER,
        ProgramId::Skybox => SKYBOX_SHADER,
        ProgramId::Pbr => PBR_SHADER,
        ProgramId::Instanced => INSTANCED_SHADER,
    }
}

/// Blinn-Phong with a 3x3 PCF shadow lookup.
pub const LIT_SHADER: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    light_space_matrix: mat4x4<f32>,
    view_pos: vec3<f32>,
    light_pos: vec3<f32>,
    shininess: f32,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var texture_diffuse1: texture_2d<f32>;
@group(1) @binding(1) var texture_specular1: texture_2d<f32>;
@group(1) @binding(4) var material_sampler: sampler;

@group(2) @binding(0) var shadow_map: texture_depth_2d;
@group(2) @binding(1) var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
    @location(3) light_space_pos: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.world_pos = world.xyz;
    out.normal = (u.model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.tex_coords = vertex.tex_coords;
    out.light_space_pos = u.light_space_matrix * world;
    out.clip_position = u.projection * u.view * world;
    return out;
}

// 0 = lit, 1 = fully shadowed. Outside the light frustum counts as lit.
fn shadow_factor(light_space_pos: vec4<f32>, bias: f32) -> f32 {
    let proj = light_space_pos.xyz / light_space_pos.w;
    let uv = vec2<f32>(proj.x * 0.5 + 0.5, 0.5 - proj.y * 0.5);
    if (proj.z > 1.0 || any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0))) {
        return 0.0;
    }
    let texel = 1.0 / vec2<f32>(textureDimensions(shadow_map));
    var lit = 0.0;
    for (var x = -1; x <= 1; x++) {
        for (var y = -1; y <= 1; y++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, proj.z - bias);
        }
    }
    return 1.0 - lit / 9.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(texture_diffuse1, material_sampler, in.tex_coords);
    let specular_strength = textureSample(texture_specular1, material_sampler, in.tex_coords).r;
    if (color.a < 0.1) {
        discard;
    }

    let normal = normalize(in.normal);
    let light_color = vec3<f32>(0.3);
    let ambient = 0.3 * color.rgb;

    let light_dir = normalize(u.light_pos - in.world_pos);
    let diffuse = max(dot(light_dir, normal), 0.0) * light_color;

    let view_dir = normalize(u.view_pos - in.world_pos);
    let halfway = normalize(light_dir + view_dir);
    let spec = pow(max(dot(normal, halfway), 0.0), u.shininess);
    let specular = spec * light_color * specular_strength;

    let bias = max(0.05 * (1.0 - dot(normal, light_dir)), 0.005);
    let shadow = shadow_factor(in.light_space_pos, bias);
    let lighting = ambient + (1.0 - shadow) * (diffuse * color.rgb + specular);
    return vec4<f32>(lighting, 1.0);
}
"#;

pub const UNLIT_SHADER: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.projection * u.view * u.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color, 1.0);
}
"#;

pub const SHADOW_DEPTH_SHADER: &str = r#"
struct Uniforms {
    light_space_matrix: mat4x4<f32>,
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.light_space_matrix * u.model * vec4<f32>(position, 1.0);
}
"#;

pub const DEPTH_DEBUG_SHADER: &str = r#"
struct Uniforms {
    near_plane: f32,
    far_plane: f32,
    linearize: i32,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var depth_map: texture_depth_2d;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) tex_coords: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.tex_coords = tex_coords;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let size = vec2<f32>(textureDimensions(depth_map));
    let coords = vec2<i32>(clamp(in.tex_coords * size, vec2<f32>(0.0), size - 1.0));
    let depth = textureLoad(depth_map, coords, 0);
    var value = depth;
    if (u.linearize != 0) {
        let n = u.near_plane;
        let f = u.far_plane;
        value = (n * f / (f - depth * (f - n))) / f;
    }
    return vec4<f32>(vec3<f32>(value), 1.0);
}
"#;

/// Drawn at the far plane: `xyww` puts every fragment at depth 1.
pub const SKYBOX_SHADER: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var skybox: texture_cube<f32>;
@group(1) @binding(1) var skybox_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.direction = position;
    let pos = u.projection * u.view * vec4<f32>(position, 1.0);
    out.clip_position = pos.xyww;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(skybox, skybox_sampler, in.direction);
}
"#;

/// Cook-Torrance with GGX distribution, Smith geometry and Schlick fresnel.
pub const PBR_SHADER: &str = r#"
const PI: f32 = 3.14159265359;

struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    normal_matrix: mat3x3<f32>,
    cam_pos: vec3<f32>,
    metallic: f32,
    roughness: f32,
    ao: f32,
    light_positions: array<vec3<f32>, 4>,
    light_colors: array<vec3<f32>, 4>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var texture_diffuse1: texture_2d<f32>;
@group(1) @binding(4) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.world_pos = world.xyz;
    out.normal = u.normal_matrix * vertex.normal;
    out.tex_coords = vertex.tex_coords;
    out.clip_position = u.projection * u.view * world;
    return out;
}

fn distribution_ggx(n: vec3<f32>, h: vec3<f32>, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = max(dot(n, h), 0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * denom * denom);
}

fn geometry_schlick_ggx(n_dot_v: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    return n_dot_v / (n_dot_v * (1.0 - k) + k);
}

fn geometry_smith(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, roughness: f32) -> f32 {
    let ggx_v = geometry_schlick_ggx(max(dot(n, v), 0.0), roughness);
    let ggx_l = geometry_schlick_ggx(max(dot(n, l), 0.0), roughness);
    return ggx_v * ggx_l;
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (1.0 - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(texture_diffuse1, material_sampler, in.tex_coords).rgb;
    let n = normalize(in.normal);
    let v = normalize(u.cam_pos - in.world_pos);
    let f0 = mix(vec3<f32>(0.04), albedo, u.metallic);

    var lo = vec3<f32>(0.0);
    for (var i = 0; i < 4; i++) {
        let to_light = u.light_positions[i] - in.world_pos;
        let l = normalize(to_light);
        let h = normalize(v + l);
        let dist = length(to_light);
        let radiance = u.light_colors[i] / (dist * dist);

        let ndf = distribution_ggx(n, h, u.roughness);
        let g = geometry_smith(n, v, l, u.roughness);
        let f = fresnel_schlick(max(dot(h, v), 0.0), f0);

        let n_dot_l = max(dot(n, l), 0.0);
        let specular = (ndf * g * f) / (4.0 * max(dot(n, v), 0.0) * n_dot_l + 0.0001);
        let kd = (vec3<f32>(1.0) - f) * (1.0 - u.metallic);
        lo += (kd * albedo / PI + specular) * radiance * n_dot_l;
    }

    let ambient = vec3<f32>(0.03) * albedo * u.ao;
    var color = ambient + lo;
    color = color / (color + vec3<f32>(1.0));
    return vec4<f32>(color, 1.0);
}
"#;

/// Per-instance model matrix in locations 5..8.
pub const INSTANCED_SHADER: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    light_dir: vec3<f32>,
    ambient: f32,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@group(1) @binding(0) var texture_diffuse1: texture_2d<f32>;
@group(1) @binding(4) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct InstanceInput {
    @location(5) model_0: vec4<f32>,
    @location(6) model_1: vec4<f32>,
    @location(7) model_2: vec4<f32>,
    @location(8) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) tex_coords: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: VertexOutput;
    out.normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.tex_coords = vertex.tex_coords;
    out.clip_position = u.projection * u.view * model * vec4<f32>(vertex.position, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(texture_diffuse1, material_sampler, in.tex_coords);
    if (color.a < 0.5) {
        discard;
    }
    // foliage is two-sided
    let diffuse = abs(dot(normalize(in.normal), -normalize(u.light_dir)));
    let lighting = u.ambient + (1.0 - u.ambient) * diffuse;
    return vec4<f32>(color.rgb * lighting, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_entry_points() {
        for program in ProgramId::ALL {
            let source = builtin(program);
            assert!(source.contains("fn vs_main"), "{program}");
            if program != ProgramId::ShadowDepth {
                assert!(source.contains("fn fs_main"), "{program}");
            }
        }
    }

    #[test]
    fn uniform_structs_declare_every_layout_field() {
        for program in ProgramId::ALL {
            let source = builtin(program);
            for field in program.uniform_layout().field_names() {
                assert!(
                    source.contains(&format!("    {field}: ")),
                    "{program} is missing {field}"
                );
            }
        }
    }
}
