/// Pass-through vertex stage for the full-screen quad.
pub const FALLBACK_VERTEX: &str = r#"#version 450 core
layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = vec4(a_position, 1.0);
}
"#;

/// Slowly scrolling magenta stripes, shown when the user's shader could not
/// be built at startup.
pub const FALLBACK_FRAGMENT: &str = r#"#version 450 core
layout(std140, set = 0, binding = 0) uniform ShellUniforms {
    vec2 u_resolution;
    float u_time;
};

layout(location = 0) out vec4 frag_color;

void main() {
    float stripe = step(0.5, fract((gl_FragCoord.x + gl_FragCoord.y + u_time * 40.0) / 48.0));
    vec2 uv = gl_FragCoord.xy / max(u_resolution, vec2(1.0));
    vec3 magenta = vec3(1.0, 0.0, 1.0) * (0.6 + 0.4 * uv.y);
    frag_color = vec4(mix(vec3(0.05), magenta, stripe), 1.0);
}
"#;
