//! # Blueprint Compiler
//!
//! Drives one Blueprint through the whole pipeline and produces its
//! generated class.
//!
//! ```rust,no_run
//! use pbcc::{Blueprint, Class, CompileOptions};
//! use std::sync::Arc;
//!
//! let mut blueprint = Blueprint::new("Door", Arc::new(Class::new("Actor", None)));
//! let output = pbcc::compile_blueprint(&mut blueprint, CompileOptions::full());
//! for message in &output.log.messages {
//!     eprintln!("{:?}: {}", message.severity, message.text);
//! }
//! ```
//!
//! ## Phases
//!
//! 1. **Name validation** - member names that collide with inherited members
//!    are renamed with a numeric suffix, and references follow the rename
//! 2. **Class preparation** - the previous class is purged and member
//!    properties are synthesized
//! 3. **Function list** - the event graph pages become one ubergraph plus an
//!    event stub per event, followed by function, delegate and interface graphs
//! 4. **Precompile** - delegate signatures first, then everything else
//! 5. **Compile** - statements per node (skipped for skeleton-only compiles)
//! 6. **Postcompile** - ordering, jump resolution, stub entry offsets
//! 7. **Class finishing** - delegate binding, layout, default object
//! 8. **Code generation** - the backend writes each function's script

pub mod class_synth;
pub mod function_compiler;
pub mod function_context;
pub mod scheduler;
pub mod statement;
pub mod validation;

pub use function_compiler::CompileEnv;
pub use function_context::{FunctionContext, StubLink, TermId, TermKind, Terminal};
pub use statement::{GotoTarget, Statement};

use crate::blueprint::{Blueprint, BlueprintType};
use crate::class::{Class, DefaultObject};
use crate::codegen::{CodegenBackend, ScriptBackend};
use crate::graph::{Direction, Graph, NodeKind, PinCategory, PN_ENTRY_POINT};
use crate::handlers::HandlerRegistry;
use crate::log::{MessageLog, ObjectRef, SourceToken};
use crate::schema::Schema;
use crate::session::{CompileOptions, SessionFlags};
use crate::transform::{
    build_event_stub, expand_timeline_nodes, expand_tunnels_and_macros, merge_ubergraph_pages,
    spawn_missing_interface_events,
};
use crate::validator::{NameValidator, NameValidity};
use function_context::NetNameMap;

/// Result of compiling one Blueprint.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub class: Class,
    pub log: MessageLog,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        !self.log.has_errors()
    }
}

/// Compiles `blueprint` with default session flags.
pub fn compile_blueprint(blueprint: &mut Blueprint, options: CompileOptions) -> CompileOutput {
    let mut context = BlueprintCompilerContext::new(blueprint, options);
    context.compile();
    context.into_output()
}

pub struct BlueprintCompilerContext<'a> {
    blueprint: &'a mut Blueprint,
    options: CompileOptions,
    session_flags: SessionFlags,
    schema: Schema,
    registry: HandlerRegistry,
    log: MessageLog,
    class: Class,
    old_defaults: Option<DefaultObject>,
    class_net_names: NetNameMap,
    functions: Vec<FunctionContext>,
    backend: Box<dyn CodegenBackend>,
}

impl<'a> BlueprintCompilerContext<'a> {
    pub fn new(blueprint: &'a mut Blueprint, options: CompileOptions) -> Self {
        Self::with_flags(blueprint, options, SessionFlags::default())
    }

    pub fn with_flags(blueprint: &'a mut Blueprint, options: CompileOptions, session_flags: SessionFlags) -> Self {
        let schema = Schema::new(blueprint.name.clone());
        let class = Class::new(blueprint.generated_class_name(), Some(blueprint.parent_class.clone()));
        Self {
            blueprint,
            options,
            session_flags,
            schema,
            registry: HandlerRegistry::new(),
            log: MessageLog::new(),
            class,
            old_defaults: None,
            class_net_names: NetNameMap::new(),
            functions: Vec::new(),
            backend: Box::new(ScriptBackend::new()),
        }
    }

    /// Replaces the code generation backend.
    pub fn with_backend(mut self, backend: Box<dyn CodegenBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn function_contexts(&self) -> &[FunctionContext] {
        &self.functions
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn into_output(self) -> CompileOutput {
        CompileOutput {
            class: self.class,
            log: self.log,
        }
    }

    fn blueprint_token(&self) -> SourceToken {
        SourceToken::new(
            ObjectRef::Blueprint(self.blueprint.name.clone()),
            self.blueprint.name.clone(),
        )
    }

    fn env(&mut self) -> CompileEnv<'_> {
        CompileEnv {
            registry: &self.registry,
            log: &mut self.log,
            schema: &self.schema,
            class: &mut self.class,
            class_net_names: &mut self.class_net_names,
            options: &self.options,
            blueprint_type: self.blueprint.blueprint_type,
        }
    }

    /// Runs every phase. Problems are reported to the message log.
    pub fn compile(&mut self) {
        tracing::info!(
            "[PBCC] Compiling blueprint '{}' ({:?}, {:?})",
            self.blueprint.name,
            self.blueprint.blueprint_type,
            self.options.compile_type
        );
        self.log = MessageLog::new();
        self.functions.clear();
        self.class_net_names = NetNameMap::new();

        tracing::info!("[PBCC] Phase 1: Validating member names...");
        self.validate_names();

        tracing::info!("[PBCC] Phase 2: Preparing class...");
        let (class, old_defaults) = class_synth::clean_and_sanitize_class(self.blueprint);
        self.class = class;
        self.old_defaults = old_defaults;
        class_synth::create_class_variables_from_blueprint(
            &mut self.class,
            self.blueprint,
            self.session_flags,
            &mut self.log,
        );
        class_synth::finalize_class_flags(&mut self.class, self.blueprint, &mut self.log);
        tracing::info!("[PBCC] {} member properties", self.class.properties.len());

        tracing::info!("[PBCC] Phase 3: Creating function list...");
        self.create_function_list();
        tracing::info!("[PBCC] {} functions to compile", self.functions.len());

        tracing::info!("[PBCC] Phase 4: Precompiling functions...");
        self.precompile_functions();

        if self.options.is_skeleton_only() {
            tracing::info!("[PBCC] Phase 5: Skipped (skeleton only)");
        } else {
            tracing::info!("[PBCC] Phase 5: Compiling functions...");
            let mut functions = std::mem::take(&mut self.functions);
            let mut env = self.env();
            for ctx in &mut functions {
                function_compiler::compile_function(ctx, &mut env);
            }
            self.functions = functions;
        }

        tracing::info!("[PBCC] Phase 6: Postcompiling functions...");
        let mut functions = std::mem::take(&mut self.functions);
        {
            let mut env = self.env();
            for ctx in &mut functions {
                function_compiler::postcompile_function(ctx, &mut env);
            }
        }
        self.functions = functions;
        self.patch_event_stubs();

        tracing::info!("[PBCC] Phase 7: Finishing class...");
        self.finish_class();

        tracing::info!("[PBCC] Phase 8: Generating code...");
        let skeleton_only = self.options.is_skeleton_only();
        self.backend
            .generate_code_from_class(&mut self.class, &self.functions, skeleton_only);

        if self.options.save_intermediate_products {
            self.blueprint.intermediate_generated_graphs =
                self.functions.iter().map(|ctx| ctx.graph.clone()).collect();
        }
        if self.options.verbose {
            for line in self.class.describe() {
                self.log.note(&line, &[]);
            }
        }
        self.blueprint.generated_class = Some(self.class.clone());

        if self.log.has_errors() {
            tracing::warn!(
                "[PBCC] Compiled '{}' with {} error(s), {} warning(s)",
                self.blueprint.name,
                self.log.num_errors,
                self.log.num_warnings
            );
        } else {
            tracing::info!(
                "[PBCC] Compilation successful! ({} warning(s))",
                self.log.num_warnings
            );
        }
    }

    /// Checks every member name against the parent class and renames clashes.
    fn validate_names(&mut self) {
        let token = self.blueprint_token();
        let mut validator = NameValidator::new(self.blueprint.parent_class.member_names());

        for index in 0..self.blueprint.new_variables.len() {
            let old = self.blueprint.new_variables[index].name.clone();
            if validator.validate(&old) == NameValidity::Ok {
                validator.reserve(&old);
                continue;
            }
            let new = validator.make_unique(&old);
            self.log.warning(
                &format!(
                    "Found a member variable with a conflicting name ({}) - changed to {}.",
                    old, new
                ),
                &[token.clone()],
            );
            let still_declared = self
                .blueprint
                .new_variables
                .iter()
                .enumerate()
                .any(|(i, v)| i != index && v.name == old);
            if !still_declared {
                self.blueprint.rename_variable_references(&old, &new);
            }
            self.blueprint.new_variables[index].name = new.clone();
            validator.reserve(&new);
        }

        for index in 0..self.blueprint.timelines.len() {
            let old = self.blueprint.timelines[index].name.clone();
            if validator.validate(&old) == NameValidity::Ok {
                validator.reserve(&old);
                continue;
            }
            let new = validator.make_unique(&old);
            self.log.warning(
                &format!("Found a timeline with a conflicting name ({}) - changed to {}.", old, new),
                &[token.clone()],
            );
            self.blueprint.rename_timeline_references(&old, &new);
            self.blueprint.timelines[index].name = new.clone();
            validator.reserve(&new);
        }

        let mut renamed_components = Vec::new();
        if let Some(scs) = self.blueprint.construction_script.as_mut() {
            scs.for_each_node_mut(|node| {
                if validator.validate(&node.variable_name) == NameValidity::Ok {
                    validator.reserve(&node.variable_name);
                    return;
                }
                let new = validator.make_unique(&node.variable_name);
                validator.reserve(&new);
                renamed_components.push((std::mem::replace(&mut node.variable_name, new.clone()), new));
            });
        }
        for (old, new) in renamed_components {
            self.log.warning(
                &format!("Found a component with a conflicting name ({}) - changed to {}.", old, new),
                &[token.clone()],
            );
            self.blueprint.rename_variable_references(&old, &new);
        }

        // functions may reuse inherited function names (overrides are checked
        // in precompile), but not property names
        let mut property_names: Vec<String> = self
            .blueprint
            .parent_class
            .hierarchy()
            .flat_map(|class| class.properties.iter().map(|p| p.name.clone()))
            .collect();
        property_names.extend(self.blueprint.new_variables.iter().map(|v| v.name.clone()));
        property_names.extend(self.blueprint.timelines.iter().map(|t| t.name.clone()));
        if let Some(scs) = &self.blueprint.construction_script {
            property_names.extend(scs.all_nodes().iter().map(|n| n.variable_name.clone()));
        }
        let mut graph_validator = NameValidator::new(property_names);
        for index in 0..self.blueprint.function_graphs.len() {
            let old = self.blueprint.function_graphs[index].name.clone();
            if graph_validator.validate(&old) == NameValidity::Ok {
                graph_validator.reserve(&old);
                continue;
            }
            let new = graph_validator.make_unique(&old);
            self.log.warning(
                &format!("Found a function graph with a conflicting name ({}) - changed to {}.", old, new),
                &[token.clone()],
            );
            self.blueprint.rename_function_references(&old, &new);
            self.blueprint.function_graphs[index].name = new.clone();
            graph_validator.reserve(&new);
        }
    }

    fn new_context(&self, name: String, graph: Graph) -> FunctionContext {
        let mut ctx = FunctionContext::new(name, graph);
        ctx.flags.const_function = self.blueprint.blueprint_type == BlueprintType::Const;
        ctx
    }

    /// Builds a context for the ubergraph, its stubs and every other graph.
    fn create_function_list(&mut self) {
        let save = self.options.save_intermediate_products;

        if self.blueprint.blueprint_type.supports_event_graphs() && !self.blueprint.ubergraph_pages.is_empty() {
            self.create_ubergraph_and_stubs();
        }

        for source in &self.blueprint.function_graphs {
            let mut graph = source.clone();
            expand_tunnels_and_macros(&mut graph, &self.blueprint.macro_graphs, &mut self.log, save);
            let name = function_name_of(&graph);
            let mut ctx = self.new_context(name, graph);
            ctx.flags.interface_stub = self.blueprint.blueprint_type == BlueprintType::Interface;
            self.functions.push(ctx);
        }

        for source in &self.blueprint.delegate_signature_graphs {
            let mut graph = source.clone();
            expand_tunnels_and_macros(&mut graph, &self.blueprint.macro_graphs, &mut self.log, save);
            let name = self.schema.delegate_signature_name(&source.name);
            let mut ctx = self.new_context(name, graph);
            ctx.delegate_signature_name = Some(source.name.clone());
            self.functions.push(ctx);
        }

        for implemented in &self.blueprint.implemented_interfaces {
            for source in &implemented.graphs {
                let mut graph = source.clone();
                expand_tunnels_and_macros(&mut graph, &self.blueprint.macro_graphs, &mut self.log, save);
                let name = function_name_of(&graph);
                let ctx = self.new_context(name, graph);
                self.functions.push(ctx);
            }
        }
    }

    /// Consolidates the event graph pages and builds a stub per event.
    fn create_ubergraph_and_stubs(&mut self) {
        let save = self.options.save_intermediate_products;
        let name = self.schema.ubergraph_function_name();
        let (mut ubergraph, _entry) =
            merge_ubergraph_pages(&self.blueprint.ubergraph_pages, &name, &mut self.log, save);
        spawn_missing_interface_events(&mut ubergraph, &self.blueprint.implemented_interfaces, &mut self.log);
        expand_tunnels_and_macros(&mut ubergraph, &self.blueprint.macro_graphs, &mut self.log, save);
        expand_timeline_nodes(&mut ubergraph, &self.blueprint.timelines, &mut self.log);

        let mut stubs = Vec::new();
        for event in ubergraph.nodes_where(NodeKind::is_event) {
            let Some(NodeKind::Event(data)) = ubergraph.kind(event).cloned() else {
                continue;
            };
            let Some(stub) = build_event_stub(
                &ubergraph,
                event,
                &self.schema,
                &self.class,
                &mut self.class_net_names,
                &mut self.log,
            ) else {
                continue;
            };
            let mut ctx = self.new_context(data.function.clone(), stub.graph);
            ctx.stub = Some(StubLink {
                source_event: event,
                ubergraph_call: stub.call,
            });
            ctx.flags.simple_stub_no_params = !stub.has_params;
            ctx.flags.internal = data.internal;
            stubs.push(ctx);
        }
        tracing::debug!("[PBCC] Built {} event stub(s)", stubs.len());

        let mut ctx = self.new_context(name, ubergraph);
        ctx.flags.event_graph = true;
        self.functions.push(ctx);
        self.functions.extend(stubs);
    }

    /// Delegate signatures go first so every other function can refer to them.
    /// The ubergraph precedes its stubs, which write its class-scoped locals.
    fn precompile_functions(&mut self) {
        let mut functions = std::mem::take(&mut self.functions);
        {
            let mut env = self.env();
            for ctx in functions.iter_mut().filter(|c| c.is_delegate_signature()) {
                function_compiler::precompile_function(ctx, &mut env);
            }
            for ctx in functions.iter_mut().filter(|c| !c.is_delegate_signature()) {
                function_compiler::precompile_function(ctx, &mut env);
            }
        }
        self.functions = functions;
    }

    /// Points each stub's ubergraph call at the offset of its event.
    fn patch_event_stubs(&mut self) {
        let labels = self
            .functions
            .iter()
            .find(|ctx| ctx.is_event_graph())
            .map(|ctx| ctx.node_labels.clone())
            .unwrap_or_default();

        for ctx in &mut self.functions {
            let Some(link) = ctx.stub else {
                continue;
            };
            let Some(offset) = labels.get(&link.source_event).copied() else {
                continue;
            };
            let Some(pin) = ctx
                .graph
                .find_pin(link.ubergraph_call, PN_ENTRY_POINT, Some(Direction::Input))
            else {
                continue;
            };
            let value = offset.to_string();
            if let Some(p) = ctx.graph.pin_mut(pin) {
                p.default_value = value.clone();
            }
            if let Some(term) = ctx.net_map.get(&pin).copied() {
                let term = ctx.term_mut(term);
                term.name = value.clone();
                term.default_value = value;
            }
            tracing::trace!("[PBCC] Stub '{}' enters the ubergraph at {}", ctx.function_name, offset);
        }
    }

    /// Binds delegate properties, then sets class flags and the default object.
    fn finish_class(&mut self) {
        for ctx in &self.functions {
            let Some(delegate) = &ctx.delegate_signature_name else {
                continue;
            };
            match self.class.find_own_property_mut(delegate) {
                Some(property) if property.ty.category == PinCategory::MulticastDelegate => {
                    property.signature_function = Some(ctx.function_name.clone());
                }
                _ => self.log.warning(
                    &format!(
                        "Delegate signature graph @@ has no multicast delegate property named {}",
                        delegate
                    ),
                    &[ctx.graph.graph_token()],
                ),
            }
        }

        class_synth::validate_rep_notifies(&mut self.class, &mut self.log);
        class_synth::check_delegate_signatures(&self.class, &mut self.log);
        self.class.static_link();
        class_synth::build_default_object(
            &mut self.class,
            self.blueprint,
            self.old_defaults.as_ref(),
            self.options.is_regenerating_on_load,
            &mut self.log,
        );
    }
}

/// A function graph compiles to a function named by its entry node, or by
/// the graph itself.
fn function_name_of(graph: &Graph) -> String {
    graph
        .nodes()
        .find_map(|node| match &node.kind {
            NodeKind::FunctionEntry(data) => data.custom_name.clone(),
            _ => None,
        })
        .unwrap_or_else(|| graph.name.clone())
}
