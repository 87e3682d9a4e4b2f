//! `orange inspect`: Print the members a specification declares.

use super::convert::to_json;
use super::LoadedConfig;
use anyhow::bail;
use orange_engine::{Blueprint, MemberDefinition, MemberKind, Runtime, Visibility};
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

pub fn execute(file: &Path, format: &str, config: &LoadedConfig) -> anyhow::Result<()> {
    let rt = Runtime::with_options(config.options.clone());
    let class = super::load_blueprint(&rt, file)?;

    match format {
        "text" => print!("{}", render_text(&class)),
        "json" => println!("{}", serde_json::to_string_pretty(&render_json(&class))?),
        other => bail!("Unknown format '{}' (expected text or json)", other),
    }
    Ok(())
}

fn render_text(class: &Blueprint) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "class {}", class.name());
    let _ = writeln!(
        out,
        "  constructor: {}",
        if class.constructor().is_some() { "yes" } else { "no" }
    );

    for visibility in Visibility::ALL {
        let members: Vec<_> = class.definitions().definitions(visibility).collect();
        if members.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}:", visibility);
        for member in members {
            let _ = writeln!(out, "    {:<9} {}{}", member.kind().as_str(), member.name(), detail(member));
        }
    }
    out
}

fn detail(member: &MemberDefinition) -> String {
    match member.kind() {
        MemberKind::Data { default } | MemberKind::WriteOnce { default } => {
            if default.is_undefined() {
                String::new()
            } else {
                format!(" = {}", to_json(default))
            }
        }
        MemberKind::Accessor { getter, setter } => {
            let mut parts = Vec::new();
            if let Some(getter) = getter {
                parts.push(format!("get {}", getter.name()));
            }
            if let Some(setter) = setter {
                parts.push(format!("set {}", setter.name()));
            }
            format!(" ({})", parts.join(", "))
        }
        MemberKind::Enumerated { names } => {
            let names: Vec<&str> = names.iter().map(|n| &**n).collect();
            format!(" [{}]", names.join(", "))
        }
    }
}

fn render_json(class: &Blueprint) -> serde_json::Value {
    let members: Vec<serde_json::Value> = class
        .definitions()
        .iter()
        .map(|member| {
            let mut entry = json!({
                "name": member.name(),
                "visibility": member.visibility().as_str(),
                "kind": member.kind().as_str(),
            });
            match member.kind() {
                MemberKind::Data { default } | MemberKind::WriteOnce { default } => {
                    entry["default"] = to_json(default);
                }
                MemberKind::Accessor { getter, setter } => {
                    entry["get"] = json!(getter.as_ref().map(|f| f.name()));
                    entry["set"] = json!(setter.as_ref().map(|f| f.name()));
                }
                MemberKind::Enumerated { names } => {
                    entry["items"] = json!(names.iter().map(|n| &**n).collect::<Vec<&str>>());
                }
            }
            entry
        })
        .collect();

    json!({
        "name": class.name(),
        "constructor": class.constructor().is_some(),
        "members": members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::convert::spec_from_json;

    fn blueprint(rt: &Runtime) -> Blueprint {
        let spec = spec_from_json(&json!({
            "count": 0,
            "protected readonly token": "abc",
            "public get size": "size",
            "public enum Mode": ["ON", "OFF"],
            "public constructor": "init",
        }))
        .unwrap();
        rt.class("Widget", &spec).unwrap()
    }

    #[test]
    fn test_text_lists_each_tier() {
        let rt = Runtime::new();
        let text = render_text(&blueprint(&rt));

        assert!(text.starts_with("class Widget\n"));
        assert!(text.contains("constructor: yes"));
        assert!(text.contains("private:"));
        assert!(text.contains("count = 0"));
        assert!(text.contains("readonly  token = \"abc\""));
        assert!(text.contains("size (get size)"));
        assert!(text.contains("Mode [ON, OFF]"));
    }

    #[test]
    fn test_json_members() {
        let rt = Runtime::new();
        let out = render_json(&blueprint(&rt));

        assert_eq!(out["name"], "Widget");
        assert_eq!(out["constructor"], true);
        let members = out["members"].as_array().unwrap();
        assert_eq!(members.len(), 4);

        let mode = members.iter().find(|m| m["name"] == "Mode").unwrap();
        assert_eq!(mode["visibility"], "public");
        assert_eq!(mode["items"], json!(["ON", "OFF"]));

        let size = members.iter().find(|m| m["name"] == "size").unwrap();
        assert_eq!(size["get"], "size");
        assert!(size["set"].is_null());
    }

    #[test]
    fn test_unknown_format_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Empty.json");
        std::fs::write(&path, "{}").unwrap();

        let config = LoadedConfig {
            options: Default::default(),
            source: None,
        };
        assert!(execute(&path, "yaml", &config).is_err());
    }
}
