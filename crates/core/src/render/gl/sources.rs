//! GLSL 3.30 sources for the two pipeline programs.
//!
//! The mesh program draws the warp grid: displaced positions as geometry,
//! lattice coordinates as texture coordinates. The quad program needs no
//! vertex buffer; it derives the four corners of a unit-square strip from
//! `gl_VertexID` and scales texture coordinates by `u_tex_extent`, which is
//! `tmax` for noise injection and `1.0` for the screen copy. Both share one
//! fragment shader that outputs the sampled texel unchanged.

/// Vertex shader for the warp mesh. Attribute 0 is the displaced position,
/// attribute 1 the lattice texture coordinate.
pub const MESH_VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_tex_coord;
uniform mat4 u_projection;
out vec2 v_uv;
void main() {
    v_uv = a_tex_coord;
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
}
"#;

/// Vertex shader for a target-filling quad. Draw with
/// `draw_arrays(TRIANGLE_STRIP, 0, 4)` and an empty VAO bound.
pub const QUAD_VERTEX_SHADER: &str = r#"#version 330 core
uniform mat4 u_projection;
uniform float u_tex_extent;
out vec2 v_uv;
void main() {
    vec2 corner = vec2(float(gl_VertexID & 1), float(gl_VertexID >> 1));
    v_uv = corner * u_tex_extent;
    gl_Position = u_projection * vec4(corner, 0.0, 1.0);
}
"#;

/// Fragment shader sampling `u_texture` at the interpolated coordinate.
pub const TEXTURE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_uv;
uniform sampler2D u_texture;
out vec4 frag_color;
void main() {
    frag_color = texture(u_texture, v_uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&str; 3] = [
        MESH_VERTEX_SHADER,
        QUAD_VERTEX_SHADER,
        TEXTURE_FRAGMENT_SHADER,
    ];

    #[test]
    fn every_source_declares_glsl_330_core() {
        for src in ALL {
            assert!(src.starts_with("#version 330 core"), "bad header in:\n{src}");
        }
    }

    #[test]
    fn vertex_shaders_pass_uv_to_fragment_shader() {
        assert!(MESH_VERTEX_SHADER.contains("out vec2 v_uv"));
        assert!(QUAD_VERTEX_SHADER.contains("out vec2 v_uv"));
        assert!(TEXTURE_FRAGMENT_SHADER.contains("in vec2 v_uv"));
    }

    #[test]
    fn mesh_shader_binds_fixed_attribute_locations() {
        assert!(MESH_VERTEX_SHADER.contains("layout(location = 0) in vec2 a_position"));
        assert!(MESH_VERTEX_SHADER.contains("layout(location = 1) in vec2 a_tex_coord"));
    }

    #[test]
    fn quad_shader_needs_no_vertex_buffer() {
        assert!(QUAD_VERTEX_SHADER.contains("gl_VertexID"));
        assert!(!QUAD_VERTEX_SHADER.contains(" in vec"));
        assert!(QUAD_VERTEX_SHADER.contains("u_tex_extent"));
    }

    #[test]
    fn both_vertex_shaders_use_the_projection_uniform() {
        assert!(MESH_VERTEX_SHADER.contains("uniform mat4 u_projection"));
        assert!(QUAD_VERTEX_SHADER.contains("uniform mat4 u_projection"));
    }
}
