//! # Compile Session
//!
//! Options for a single compile and the session object that guards against
//! overlapping compiles.

use crate::blueprint::Blueprint;
use crate::compiler::{BlueprintCompilerContext, CompileOutput};
use crate::error::{CompileError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompileType {
    /// Class layout and function signatures only, no bytecode.
    SkeletonOnly,
    #[default]
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub compile_type: CompileType,
    /// Keep expanded graphs on the Blueprint and force-keep comment nodes.
    pub save_intermediate_products: bool,
    /// Emit a comment statement ahead of each node's code.
    pub emit_node_comments: bool,
    pub is_regenerating_on_load: bool,
    /// Dump the finished class layout to the message log as notes.
    pub verbose: bool,
}

impl CompileOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn skeleton_only() -> Self {
        Self {
            compile_type: CompileType::SkeletonOnly,
            ..Self::default()
        }
    }

    pub fn is_skeleton_only(&self) -> bool {
        self.compile_type == CompileType::SkeletonOnly
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mode flags visible to everything running inside a compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFlags {
    /// Component templates get the `_GEN_VARIABLE` suffix while compiling.
    pub suffix_component_templates: bool,
}

impl Default for SessionFlags {
    fn default() -> Self {
        Self {
            suffix_component_templates: true,
        }
    }
}

/// Owns the "currently compiling" state. One Blueprint compiles at a time.
#[derive(Debug, Default)]
pub struct CompileSession {
    pub flags: SessionFlags,
    active: Option<String>,
    compiled: usize,
}

impl CompileSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_compiling(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_blueprint(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Number of compiles this session has completed.
    pub fn compiled_count(&self) -> usize {
        self.compiled
    }

    /// Marks `blueprint` as compiling; fails if another compile is in progress.
    pub fn begin(&mut self, blueprint: &str) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(CompileError::ReentrantCompile {
                active: active.clone(),
                requested: blueprint.to_string(),
            });
        }
        tracing::debug!("[PBCC] Session: begin compiling '{}'", blueprint);
        self.active = Some(blueprint.to_string());
        Ok(())
    }

    pub fn end(&mut self) {
        if let Some(name) = self.active.take() {
            tracing::debug!("[PBCC] Session: finished compiling '{}'", name);
            self.compiled += 1;
        }
    }

    /// Compiles a Blueprint start to finish.
    ///
    /// Problems in the Blueprint are reported through the returned log; `Err`
    /// only signals that another compile is already running.
    pub fn compile_blueprint(
        &mut self,
        blueprint: &mut Blueprint,
        options: CompileOptions,
    ) -> Result<CompileOutput> {
        self.begin(&blueprint.name)?;
        let mut context = BlueprintCompilerContext::with_flags(blueprint, options, self.flags);
        context.compile();
        let output = context.into_output();
        self.end();
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let options = CompileOptions::from_json(
            r#"{ "compile_type": "SkeletonOnly", "save_intermediate_products": true }"#,
        )
        .unwrap();
        assert!(options.is_skeleton_only());
        assert!(options.save_intermediate_products);
        assert!(!options.emit_node_comments);
    }

    #[test]
    fn test_nested_begin_is_rejected() {
        let mut session = CompileSession::new();
        session.begin("A").unwrap();
        let err = session.begin("B").unwrap_err();
        assert!(matches!(err, CompileError::ReentrantCompile { .. }));
        session.end();
        assert!(session.begin("B").is_ok());
        assert_eq!(session.compiled_count(), 1);
    }
}
