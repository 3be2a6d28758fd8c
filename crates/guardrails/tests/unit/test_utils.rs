//! Shared test utilities for guardrails tests

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a file (and its parent directories) below `root`
pub fn create_file_at_path(root: &Path, relative_path: &str, content: &str) {
    let full_path = root.join(relative_path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full_path, content).unwrap();
}

/// A source tree with one clean file per layer
pub fn create_layered_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    create_file_at_path(root, "primitives/Box/Box.tsx", "export const Box = () => null;\n");
    create_file_at_path(
        root,
        "composed/Card/Card.tsx",
        "import { Box } from '../../primitives/Box';\nexport const Card = () => null;\n",
    );
    create_file_at_path(
        root,
        "blocks/Hero/Hero.tsx",
        "import { Card } from '../../composed/Card';\nimport { Box } from '../../primitives/Box';\n",
    );
    create_file_at_path(
        root,
        "pages/Home.tsx",
        "import { Hero } from '../blocks/Hero';\nimport React from 'react';\n",
    );
    temp
}

pub const NARRATIVE: &str = "# {name}

## Overview
A surface grouping related content.

## Anatomy
Root box with title and body slots.

## Props
| Name | Type |
|------|------|
| title | string |

## States
Default and hover.

## Accessibility
Rendered as an article landmark.

## Test IDs
See the registry.
";

/// Write a complete, valid artifact set for component `name` into `dir`
pub fn create_component(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("SPEC.md"), NARRATIVE.replace("{name}", name)).unwrap();
    fs::write(
        dir.join("COMPOSITION.json"),
        serde_json::to_string_pretty(&serde_json::json!({
            "componentName": name,
            "version": "1.0.0",
            "root": {
                "componentRef": "Box",
                "role": "article",
                "dataAttributes": { "data-testid": "root" },
                "children": [
                    { "componentRef": "Text", "slot": "title" },
                    { "componentRef": "Stack", "slot": "body", "children": [
                        { "componentRef": "Text" }
                    ]}
                ]
            }
        }))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("TESTIDS.json"),
        serde_json::to_string_pretty(&serde_json::json!({
            "componentName": name,
            "testIds": [
                { "id": "root", "element": "article", "description": "outer box" }
            ]
        }))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("APPROVAL.json"),
        serde_json::to_string_pretty(&approval_record(name)).unwrap(),
    )
    .unwrap();
}

/// A consistent approval record in review
pub fn approval_record(name: &str) -> serde_json::Value {
    serde_json::json!({
        "componentName": name,
        "version": "1.0.0",
        "status": "in_review",
        "workflow": {
            "currentPhase": "review",
            "phases": [
                {
                    "name": "design",
                    "status": "approved",
                    "requiredApprovals": ["designer"],
                    "approvals": [{
                        "phase": "design",
                        "role": "designer",
                        "approver": "dana",
                        "timestamp": "2024-05-01T10:00:00Z"
                    }],
                    "artifacts": ["SPEC.md", "COMPOSITION.json"]
                },
                {
                    "name": "review",
                    "status": "in_progress",
                    "requiredApprovals": ["engineer", "a11y"],
                    "approvals": [],
                    "artifacts": ["TESTIDS.json"]
                }
            ]
        },
        "approvals": [],
        "comments": [{
            "author": "ali",
            "timestamp": "2024-05-02T09:00:00Z",
            "text": "Focus ring needs more contrast",
            "phase": "review"
        }],
        "blockers": [{
            "id": "contrast",
            "description": "Focus ring contrast below 3:1",
            "status": "open",
            "createdAt": "2024-05-02T09:05:00Z"
        }],
        "history": [
            { "timestamp": "2024-05-01T09:00:00Z", "action": "created", "actor": "dana" },
            {
                "timestamp": "2024-05-01T12:00:00Z",
                "action": "status_change",
                "actor": "dana",
                "from": "draft",
                "to": "in_review"
            }
        ]
    })
}
