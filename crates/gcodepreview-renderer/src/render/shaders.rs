//! GLSL sources for the preview scene.

/// Vertex shader shared by the toolpath mesh and the bed grid.
pub const SCENE_VERTEX_SHADER: &str = r#"
#version 330 core

layout (location = 0) in vec3 in_position;
layout (location = 1) in vec3 in_normal;

uniform mat4 mvp_matrix;
uniform mat4 model_matrix;
uniform mat3 normal_matrix;

out vec3 frag_position;
out vec3 frag_normal;

void main() {
    frag_position = vec3(model_matrix * vec4(in_position, 1.0));
    frag_normal = normal_matrix * in_normal;
    gl_Position = mvp_matrix * vec4(in_position, 1.0);
}
"#;

/// Phong fragment shader with a Blinn-Phong specular term.
pub const SCENE_FRAGMENT_SHADER: &str = r#"
#version 330 core

in vec3 frag_position;
in vec3 frag_normal;

uniform vec3 light_position;
uniform vec3 view_position;
uniform vec3 light_color;
uniform vec3 ambient_color;
uniform vec3 diffuse_color;
uniform vec3 specular_color;
uniform float shininess;

out vec4 out_color;

void main() {
    vec3 normal = normalize(frag_normal);
    vec3 light_dir = normalize(light_position - frag_position);
    vec3 view_dir = normalize(view_position - frag_position);
    vec3 halfway = normalize(light_dir + view_dir);

    float diff = max(dot(normal, light_dir), 0.0);
    float spec = pow(max(dot(normal, halfway), 0.0), shininess);

    vec3 color = (ambient_color + diff * diffuse_color + spec * specular_color) * light_color;
    out_color = vec4(color, 1.0);
}
"#;
