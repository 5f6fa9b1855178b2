use crate::gomod::Dependency;

/// Render the `main.go` that links the host command with every plugin.
pub fn render_main_go(host_module: &str, plugins: &[Dependency]) -> String {
  let mut imports = String::new();
  for plugin in plugins {
    imports.push_str(&format!("\t_ \"{}\"\n", plugin.package_path));
  }

  format!(
    r#"package main

import (
	caddycmd "{host}/cmd"

	// plug in Caddy modules here
	_ "{host}/modules/standard"
{imports})

func main() {{
	caddycmd.Main()
}}
"#,
    host = host_module,
    imports = imports,
  )
}
