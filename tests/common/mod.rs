#![allow(dead_code)]

pub mod project {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A throwaway Spring project under a temporary directory.
    pub struct SpringProject {
        dir: TempDir,
    }

    impl SpringProject {
        /// Empty project with a `src/main/java` tree.
        pub fn empty() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("src/main/java")).unwrap();
            SpringProject { dir }
        }

        /// Project whose only source is an application entry point in `base`.
        pub fn with_application(base: &str) -> Self {
            let project = Self::empty();
            project.java(
                base,
                "Application",
                &format!(
                    "package {base};\n\n\
                     import org.springframework.boot.autoconfigure.SpringBootApplication;\n\n\
                     @SpringBootApplication\n\
                     public class Application {{\n}}\n"
                ),
            );
            project
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn source_root(&self) -> PathBuf {
            self.root().join("src/main/java")
        }

        /// Write `{package}/{class}.java` under the source root.
        pub fn java(&self, package: &str, class: &str, content: &str) -> PathBuf {
            let mut path = self.source_root();
            path.extend(package.split('.'));
            fs::create_dir_all(&path).unwrap();
            path.push(format!("{class}.java"));
            fs::write(&path, content).unwrap();
            path
        }

        /// A component annotated with `annotation` in `package`.
        pub fn component(&self, package: &str, class: &str, annotation: &str) -> PathBuf {
            self.java(
                package,
                class,
                &format!("package {package};\n\n@{annotation}\npublic class {class} {{\n}}\n"),
            )
        }

        /// Write a file at `relative` under the project root.
        pub fn file(&self, relative: &str, content: &str) -> PathBuf {
            let path = self.root().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }

        /// Every `.java` file below the source root, relative to the project root.
        pub fn java_files(&self) -> Vec<PathBuf> {
            let mut files: Vec<PathBuf> = walkdir::WalkDir::new(self.source_root())
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
                .map(|e| e.path().strip_prefix(self.root()).unwrap().to_path_buf())
                .collect();
            files.sort();
            files
        }

        /// Files directly in the project root whose name starts with `prefix`.
        pub fn root_files(&self, prefix: &str) -> Vec<PathBuf> {
            let mut files: Vec<PathBuf> = fs::read_dir(self.root())
                .unwrap()
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
                })
                .collect();
            files.sort();
            files
        }

        /// `paths` made relative to the project root, sorted.
        pub fn relative(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
            let mut out: Vec<PathBuf> = paths
                .iter()
                .map(|p| p.strip_prefix(self.root()).unwrap_or(p).to_path_buf())
                .collect();
            out.sort();
            out
        }
    }
}

/// A legacy controller still speaking form-encoded XML.
pub const LEGACY_CONTROLLER: &str = r#"package com.acme.shop.web;

import javax.xml.bind.JAXBContext;
import org.springframework.web.bind.annotation.*;
import org.w3c.dom.Document;

@RestController
@RequestMapping(value = "/legacy", consumes = "application/x-www-form-urlencoded")
public class SaleController {

    @PostMapping(value = "/processxml.do", consumes = MediaType.APPLICATION_FORM_URLENCODED_VALUE)
    public String sale(@RequestParam("xmldata") String xmldata, Document doc) {
        return marshaller.marshal(service.sale(xmldata));
    }

    @GetMapping("/health")
    public String health() {
        return "ok";
    }
}
"#;

/// Three operations in one tag; the second uses a verb no controller can route.
pub const DEVICES_SPEC: &str = r#"openapi: 3.0.3
info:
  title: Devices
  version: 1.0.0
paths:
  /devices:
    get:
      operationId: listDevices
      summary: List devices
      tags: [Devices]
      responses:
        '200':
          description: Devices
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Device'
  /devices/{deviceId}:
    head:
      operationId: pingDevice
      summary: Check a device exists
      tags: [Devices]
      parameters:
        - name: deviceId
          in: path
          required: true
          schema:
            type: string
      responses:
        '200':
          description: Exists
  /devices/register:
    post:
      operationId: createDevice
      summary: Register a device
      tags: [Devices]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Device'
      responses:
        '201':
          description: Registered
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Device'
components:
  schemas:
    Device:
      type: object
      required: [serial]
      properties:
        serial:
          type: string
        label:
          type: string
"#;
