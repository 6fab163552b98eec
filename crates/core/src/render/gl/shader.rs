//! Shader compilation and linking.
//!
//! The pipeline uses two small programs (mesh warp and textured quad).
//! Failures carry the driver log with the offending source numbered line
//! by line, since driver messages only reference line numbers.

use thiserror::Error;

/// A shader stage failed to compile or a program failed to link.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    #[error("{program} {stage} shader failed to compile:\n{log}")]
    Compile {
        /// Which program the stage belongs to (e.g. "mesh").
        program: String,
        /// "vertex" or "fragment".
        stage: String,
        log: String,
    },
    #[error("{program} program failed to link:\n{log}")]
    Link { program: String, log: String },
}

/// Prefixes each source line with its right-aligned number and appends the
/// driver log after a blank line. Either part may be empty.
pub fn number_source(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    [numbered.as_str(), log]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[allow(unsafe_code)]
fn compile_stage(
    gl: &glow::Context,
    program: &str,
    stage: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    let stage_name = if stage == glow::VERTEX_SHADER {
        "vertex"
    } else {
        "fragment"
    };
    let compile_error = |log: String| ShaderError::Compile {
        program: program.to_string(),
        stage: stage_name.to_string(),
        log,
    };

    // SAFETY: glow wraps raw GL calls as unsafe. The shader handle is
    // created here and deleted on the failure path.
    unsafe {
        let shader = gl.create_shader(stage).map_err(compile_error)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            Err(compile_error(number_source(source, &log)))
        }
    }
}

/// Compiles both stages and links them into a program labelled `program`
/// for error messages. Stage handles are deleted whatever the outcome.
///
/// # Errors
///
/// Returns `ShaderError::Compile` or `ShaderError::Link` with the driver log.
#[allow(unsafe_code)]
pub fn compile_program(
    gl: &glow::Context,
    program: &str,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let vertex = compile_stage(gl, program, glow::VERTEX_SHADER, vertex_src)?;
    let fragment = match compile_stage(gl, program, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: vertex is a live shader from compile_stage.
            unsafe { gl.delete_shader(vertex) };
            return Err(e);
        }
    };

    let link_error = |log: String| ShaderError::Link {
        program: program.to_string(),
        log,
    };

    // SAFETY: both stage handles are live; the program is created here and
    // deleted if linking fails. The linked program keeps its own copies.
    unsafe {
        let result = gl.create_program().map_err(link_error).and_then(|handle| {
            gl.attach_shader(handle, vertex);
            gl.attach_shader(handle, fragment);
            gl.link_program(handle);
            gl.detach_shader(handle, vertex);
            gl.detach_shader(handle, fragment);
            if gl.get_program_link_status(handle) {
                Ok(handle)
            } else {
                let log = gl.get_program_info_log(handle);
                gl.delete_program(handle);
                Err(link_error(log))
            }
        });
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        result
    }
}
