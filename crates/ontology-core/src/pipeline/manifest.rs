//! Build tool and dependency inventory from well-known manifest files.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::Value as Json;
use toml::Value as Toml;
use tracing::debug;

use crate::model::{BuildTool, Dependency};
use crate::resolve::{base_name, extension, RepoFiles};

static GRADLE_DEPENDENCY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:implementation|api|compile|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly|annotationProcessor|kapt)\s*\(?\s*["']([^"':\s]+):([^"':\s]+)(?::([^"'\s]+))?["']"#,
    )
    .ok()
});

static REQUIREMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._\-]*)(?:\[[^\]]*\])?\s*(?:(==|>=|<=|~=|!=|>|<)\s*([^\s;,#]+))?")
        .ok()
});

static SETUP_REQUIRES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)install_requires\s*=\s*\[(.*?)\]").ok());

static QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).ok());

/// Build tools and declared dependencies found in the repository.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub build_tools: Vec<BuildTool>,
    pub dependencies: Vec<Dependency>,
}

impl Inventory {
    fn tool(&mut self, name: &str, file: &str) {
        self.build_tools.push(BuildTool {
            name: name.to_string(),
            file: file.to_string(),
        });
    }

    fn dependency(&mut self, ecosystem: &str, file: &str, name: &str, version: Option<String>) {
        self.dependencies.push(Dependency {
            name: name.to_string(),
            version: version.filter(|v| !v.is_empty() && v != "*"),
            ecosystem: ecosystem.to_string(),
            file: file.to_string(),
        });
    }
}

/// Scan every known manifest. Files that cannot be read still count as a
/// build tool, just without dependencies.
pub fn inventory(repo: &RepoFiles) -> Inventory {
    let mut inventory = Inventory::default();
    for path in repo.paths() {
        let Some(tool) = build_tool_for(path) else {
            continue;
        };
        inventory.tool(tool, path);

        let Some(text) = repo.read(path) else {
            continue;
        };
        match tool {
            "go" => go_mod(&mut inventory, path, &text),
            "npm" => package_json(&mut inventory, path, &text),
            "maven" => pom_xml(&mut inventory, path, &text),
            "gradle" => gradle(&mut inventory, path, &text),
            "pip" => requirements_txt(&mut inventory, path, &text),
            "pyproject" => pyproject(&mut inventory, path, &text),
            "pipenv" => pipfile(&mut inventory, path, &text),
            "setuptools" => setup_py(&mut inventory, path, &text),
            "dotnet" | "nuget" => nuget_xml(&mut inventory, path, &text),
            "sfdx" => sfdx_project(&mut inventory, path, &text),
            _ => {}
        }
    }

    debug!(
        build_tools = inventory.build_tools.len(),
        dependencies = inventory.dependencies.len(),
        "Manifest inventory collected"
    );
    inventory
}

fn build_tool_for(path: &str) -> Option<&'static str> {
    let tool = match base_name(path) {
        "go.mod" => "go",
        "package.json" => "npm",
        "pom.xml" => "maven",
        "build.gradle" | "build.gradle.kts" => "gradle",
        "requirements.txt" => "pip",
        "pyproject.toml" => "pyproject",
        "Pipfile" => "pipenv",
        "setup.py" => "setuptools",
        "packages.config" => "nuget",
        "sfdx-project.json" => "sfdx",
        _ => match extension(path) {
            Some("csproj") => "dotnet",
            _ => return None,
        },
    };
    Some(tool)
}

fn go_mod(inventory: &mut Inventory, file: &str, text: &str) {
    let mut in_block = false;
    for line in text.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
            require_line(inventory, file, line);
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
            } else {
                require_line(inventory, file, rest);
            }
        }
    }
}

fn require_line(inventory: &mut Inventory, file: &str, line: &str) {
    let mut parts = line.split_whitespace();
    if let Some(module) = parts.next() {
        inventory.dependency("go", file, module, parts.next().map(str::to_string));
    }
}

fn package_json(inventory: &mut Inventory, file: &str, text: &str) {
    let Ok(doc) = serde_json::from_str::<Json>(text) else {
        debug!(file, "Unparseable package.json");
        return;
    };
    for section in ["dependencies", "devDependencies"] {
        let Some(deps) = doc.get(section).and_then(Json::as_object) else {
            continue;
        };
        for (name, version) in deps {
            inventory.dependency("npm", file, name, version.as_str().map(str::to_string));
        }
    }
}

/// Direct `<project><dependencies>` entries. Managed and plugin
/// dependencies are left out.
fn pom_xml(inventory: &mut Inventory, file: &str, text: &str) {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut path: Vec<String> = Vec::new();
    let (mut group, mut artifact, mut version) = (None, None, None);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => path.push(local_name(&element)),
            Ok(Event::Text(content)) => {
                let Some(field) = path.last() else {
                    continue;
                };
                if path.len() != 4 || !is_project_dependency(&path[..3]) {
                    continue;
                }
                let value = content.decode().ok().map(|v| v.trim().to_string());
                match field.as_str() {
                    "groupId" => group = value,
                    "artifactId" => artifact = value,
                    "version" => version = value,
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                if is_project_dependency(&path) {
                    if let (Some(group), Some(artifact)) = (group.take(), artifact.take()) {
                        inventory.dependency("maven", file, &format!("{}:{}", group, artifact), version.take());
                    }
                    version = None;
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(file, error = %err, "Unparseable pom.xml");
                break;
            }
            _ => {}
        }
    }
}

fn is_project_dependency(path: &[String]) -> bool {
    matches!(path, [project, list, entry]
        if project == "project" && list == "dependencies" && entry == "dependency")
}

fn gradle(inventory: &mut Inventory, file: &str, text: &str) {
    let Some(re) = GRADLE_DEPENDENCY.as_ref() else {
        return;
    };
    for caps in re.captures_iter(text) {
        let name = format!("{}:{}", &caps[1], &caps[2]);
        let version = caps.get(3).map(|m| m.as_str().to_string());
        inventory.dependency("gradle", file, &name, version);
    }
}

/// A PEP 508 requirement: name plus version spec. `==` is dropped from
/// pinned versions; other operators are kept.
fn requirement(spec: &str) -> Option<(String, Option<String>)> {
    let caps = REQUIREMENT.as_ref()?.captures(spec.trim())?;
    let name = caps[1].to_string();
    let version = match (caps.get(2), caps.get(3)) {
        (Some(op), Some(v)) if op.as_str() == "==" => Some(v.as_str().to_string()),
        (Some(op), Some(v)) => Some(format!("{}{}", op.as_str(), v.as_str())),
        _ => None,
    };
    Some((name, version))
}

fn requirements_txt(inventory: &mut Inventory, file: &str, text: &str) {
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        if let Some((name, version)) = requirement(line) {
            inventory.dependency("pypi", file, &name, version);
        }
    }
}

fn pyproject(inventory: &mut Inventory, file: &str, text: &str) {
    let Ok(doc) = text.parse::<Toml>() else {
        debug!(file, "Unparseable pyproject.toml");
        return;
    };

    let pep621 = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(Toml::as_array);
    for spec in pep621.into_iter().flatten().filter_map(Toml::as_str) {
        if let Some((name, version)) = requirement(spec) {
            inventory.dependency("pypi", file, &name, version);
        }
    }

    let Some(poetry) = doc.get("tool").and_then(|t| t.get("poetry")) else {
        return;
    };
    if let Some(tool) = inventory.build_tools.last_mut() {
        tool.name = "poetry".to_string();
    }
    toml_table(inventory, file, poetry.get("dependencies"));
}

fn pipfile(inventory: &mut Inventory, file: &str, text: &str) {
    let Ok(doc) = text.parse::<Toml>() else {
        debug!(file, "Unparseable Pipfile");
        return;
    };
    toml_table(inventory, file, doc.get("packages"));
    toml_table(inventory, file, doc.get("dev-packages"));
}

/// `name = "version"` or `name = { version = "..." }` entries. The
/// interpreter pin `python` is not a dependency.
fn toml_table(inventory: &mut Inventory, file: &str, table: Option<&Toml>) {
    let Some(table) = table.and_then(Toml::as_table) else {
        return;
    };
    for (name, value) in table {
        if name == "python" {
            continue;
        }
        let version = match value {
            Toml::String(v) => Some(v.clone()),
            Toml::Table(t) => t.get("version").and_then(Toml::as_str).map(str::to_string),
            _ => None,
        };
        inventory.dependency("pypi", file, name, version);
    }
}

fn setup_py(inventory: &mut Inventory, file: &str, text: &str) {
    let (Some(block), Some(quoted)) = (SETUP_REQUIRES.as_ref(), QUOTED.as_ref()) else {
        return;
    };
    let Some(list) = block.captures(text) else {
        return;
    };
    for spec in quoted.captures_iter(&list[1]) {
        if let Some((name, version)) = requirement(&spec[1]) {
            inventory.dependency("pypi", file, &name, version);
        }
    }
}

/// `<PackageReference Include=".." Version=".."/>` in project files, with
/// the version either as an attribute or a child element, and
/// `<package id=".." version=".."/>` in packages.config.
fn nuget_xml(inventory: &mut Inventory, file: &str, text: &str) {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut open: Option<(String, Option<String>)> = None;
    let mut in_version = false;
    loop {
        match reader.read_event() {
            Ok(Event::Empty(element)) => {
                if let Some((name, version)) = package_reference(&element) {
                    inventory.dependency("nuget", file, &name, version);
                }
            }
            Ok(Event::Start(element)) => {
                if open.is_some() {
                    in_version = local_name(&element) == "Version";
                } else {
                    open = package_reference(&element);
                }
            }
            Ok(Event::Text(content)) if in_version => {
                if let Some((_, version)) = open.as_mut() {
                    *version = content.decode().ok().map(|v| v.trim().to_string());
                }
            }
            Ok(Event::End(element)) => {
                if in_version {
                    in_version = false;
                } else if matches!(element.local_name().as_ref(), b"PackageReference" | b"package") {
                    if let Some((name, version)) = open.take() {
                        inventory.dependency("nuget", file, &name, version);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(file, error = %err, "Unparseable NuGet manifest");
                break;
            }
            _ => {}
        }
    }
}

/// Name and version of a `PackageReference` or `package` element.
fn package_reference(element: &BytesStart) -> Option<(String, Option<String>)> {
    let (name_key, version_key) = match element.local_name().as_ref() {
        b"PackageReference" => ("Include", "Version"),
        b"package" => ("id", "version"),
        _ => return None,
    };
    Some((attribute(element, name_key)?, attribute(element, version_key)))
}

fn attribute(element: &BytesStart, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).trim().to_string())
}

fn local_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn sfdx_project(inventory: &mut Inventory, file: &str, text: &str) {
    let Ok(doc) = serde_json::from_str::<Json>(text) else {
        debug!(file, "Unparseable sfdx-project.json");
        return;
    };
    let directories = doc.get("packageDirectories").and_then(Json::as_array);
    for directory in directories.into_iter().flatten() {
        let dependencies = directory.get("dependencies").and_then(Json::as_array);
        for dependency in dependencies.into_iter().flatten() {
            let Some(name) = dependency.get("package").and_then(Json::as_str) else {
                continue;
            };
            let version = dependency
                .get("versionNumber")
                .and_then(Json::as_str)
                .map(str::to_string);
            inventory.dependency("salesforce", file, name, version);
        }
    }
}
