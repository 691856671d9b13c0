//! End-to-end compiles through the public API.

mod common;

use common::*;
use pbcc::graph::{
    CallData, Direction, EventData, Graph, MacroData, NodeKind, PinType, VariableReference, PN_EXECUTE, PN_THEN,
};
use pbcc::{
    compile_blueprint, BlueprintCompilerContext, Class, ClassFlags, CompileError, CompileOptions, CompileSession,
    Function, FunctionFlags, ImplementedInterface, Operand, PropertyFlags, ScriptOp, Severity, TimelineTemplate,
    Value, VariableDescription,
};
use std::sync::Arc;

#[test]
fn test_minimal_function_falls_through_to_return() {
    init_tracing();
    let mut bp = door();
    bp.function_graphs.push(simple_function("Open", "PlaySound"));

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let open = output.class.find_own_function("Open").unwrap();
    assert!(open.flags.contains(FunctionFlags::BLUEPRINT_CALLABLE));
    let code = code_only(&open.script);
    assert_eq!(
        code,
        vec![
            ScriptOp::CallFunction {
                function: "PlaySound".into(),
                context: None,
                args: vec![],
                result: None,
            },
            ScriptOp::Return,
        ]
    );
    assert!(!code.iter().any(|op| matches!(op, ScriptOp::Jump(_))));
    assert!(bp.generated_class.is_some());
}

#[test]
fn test_conflicting_variable_is_renamed_with_its_references() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("Speed", PinType::float()).with_default("1.5"));

    let mut graph = Graph::new("SetSpeed");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let set = graph.spawn_node(NodeKind::VariableSet(Some(VariableReference::self_member(
        "Speed",
        PinType::float(),
    ))));
    graph.connect(entry, PN_THEN, set, PN_EXECUTE).unwrap();
    let value = graph.find_pin(set, "Speed", Some(Direction::Input)).unwrap();
    graph.pin_mut(value).unwrap().default_value = "3.0".into();
    bp.function_graphs.push(graph);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let warnings: Vec<_> = output.log.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("(Speed) - changed to Speed_1"));
    assert_eq!(bp.new_variables[0].name, "Speed_1");
    assert!(output.class.find_own_property("Speed_1").is_some());
    assert!(output.class.find_own_property("Speed").is_none());

    let script = &output.class.find_own_function("SetSpeed").unwrap().script;
    assert!(script.contains(&ScriptOp::Let {
        dest: Operand::Instance("Speed_1".into()),
        src: Operand::Literal(Value::Float(3.0)),
    }));
    assert_eq!(
        output.class.default_object.as_ref().unwrap().get("Speed_1"),
        Some(&Value::Float(1.5))
    );
}

#[test]
fn test_unreachable_nodes_generate_no_code() {
    init_tracing();
    let mut bp = door();
    let mut graph = simple_function("Open", "PlaySound");
    graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Orphan")));
    bp.function_graphs.push(graph);

    let mut options = CompileOptions::full();
    options.save_intermediate_products = true;
    let output = compile_blueprint(&mut bp, options);
    assert!(output.succeeded());

    let script = &output.class.find_own_function("Open").unwrap().script;
    assert_eq!(calls(script), vec!["PlaySound".to_string()]);
    let expanded = bp
        .intermediate_generated_graphs
        .iter()
        .find(|g| g.name == "Open")
        .unwrap();
    assert!(!expanded
        .nodes()
        .any(|n| matches!(&n.kind, NodeKind::CallFunction(c) if c.function == "Orphan")));
}

#[test]
fn test_entry_count_errors_are_reported_once() {
    init_tracing();
    let mut bp = door();
    let mut twice = Graph::new("Twice");
    twice.spawn_node(NodeKind::FunctionEntry(Default::default()));
    twice.spawn_node(NodeKind::FunctionEntry(Default::default()));
    bp.function_graphs.push(twice);
    let mut none = Graph::new("Headless");
    none.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
    bp.function_graphs.push(none);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    let errors: Vec<_> = output.log.errors().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .any(|m| m.text.starts_with("Expected only one function entry node")));
    assert!(errors.iter().any(|m| m.text.starts_with("Could not find a root node")));
    // the rest of the class still builds
    assert!(output.class.default_object.is_some());
}

#[test]
fn test_event_stubs_enter_the_ubergraph_at_their_event() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("LastDelta", PinType::float()));
    let (page, _, _) = event_page();
    bp.ubergraph_pages.push(page);

    let mut compiler = BlueprintCompilerContext::new(&mut bp, CompileOptions::full());
    compiler.compile();
    assert!(!compiler.log().has_errors(), "{:?}", compiler.log().messages);

    let ubergraph = compiler
        .function_contexts()
        .iter()
        .find(|ctx| ctx.is_event_graph())
        .unwrap();
    assert_eq!(ubergraph.function_name, "ExecuteUbergraph_Door");

    let mut labels = Vec::new();
    for name in ["ReceiveBeginPlay", "ReceiveTick"] {
        let stub = compiler
            .function_contexts()
            .iter()
            .find(|ctx| ctx.function_name == name)
            .unwrap();
        let link = stub.stub.unwrap();
        let label = ubergraph.node_labels[&link.source_event];
        labels.push(label);

        let function = compiler.class().find_own_function(name).unwrap();
        assert!(function.flags.contains(FunctionFlags::EVENT));
        assert_eq!(function.super_function.as_deref(), Some(format!("Actor::{}", name).as_str()));
        assert!(function.script.contains(&ScriptOp::CallFunction {
            function: "ExecuteUbergraph_Door".into(),
            context: None,
            args: vec![Operand::Literal(Value::Int(label as i32))],
            result: None,
        }));
    }
    assert_ne!(labels[0], labels[1]);

    // the ubergraph dispatches on its entry offset and ends each thread
    let uber_script = &compiler
        .class()
        .find_own_function("ExecuteUbergraph_Door")
        .unwrap()
        .script;
    assert!(matches!(code_only(uber_script).first(), Some(ScriptOp::ComputedJump(_))));
    assert!(uber_script.contains(&ScriptOp::EndOfThread));
    assert_eq!(uber_script.last(), Some(&ScriptOp::Return));
}

#[test]
fn test_event_parameters_reach_the_ubergraph_through_class_storage() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("LastDelta", PinType::float()));
    let (page, _, _) = event_page();
    bp.ubergraph_pages.push(page);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let tick = output.class.find_own_function("ReceiveTick").unwrap();
    assert_eq!(tick.num_parms, 1);
    let stored = tick
        .script
        .iter()
        .find_map(|op| match op {
            ScriptOp::Let {
                dest: Operand::Instance(member),
                src: Operand::Local(param),
            } if param == "DeltaSeconds" => Some(member.clone()),
            _ => None,
        })
        .expect("stub stores its parameter");
    assert!(output.class.find_own_property(&stored).is_some());

    let uber = output.class.find_own_function("ExecuteUbergraph_Door").unwrap();
    assert!(uber.script.contains(&ScriptOp::Let {
        dest: Operand::Instance("LastDelta".into()),
        src: Operand::Instance(stored),
    }));
}

#[test]
fn test_macro_instances_compile_like_their_bodies() {
    init_tracing();
    let mut body = Graph::new("DoInner");
    let inputs = body.spawn_node(NodeKind::Tunnel { entry: true });
    let outputs = body.spawn_node(NodeKind::Tunnel { entry: false });
    body.add_pin(inputs, Direction::Output, "Exec", PinType::exec()).unwrap();
    body.add_pin(outputs, Direction::Input, "Done", PinType::exec()).unwrap();
    let inner = body.spawn_node(NodeKind::CallFunction(CallData::self_call("Inner")));
    body.connect(inputs, "Exec", inner, PN_EXECUTE).unwrap();
    body.connect(inner, PN_THEN, outputs, "Done").unwrap();

    let mut graph = Graph::new("Run");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let instance = graph.spawn_node(NodeKind::MacroInstance(MacroData {
        macro_graph: "DoInner".into(),
        resolved_wildcard_type: None,
    }));
    graph.add_pin(instance, Direction::Input, "Exec", PinType::exec()).unwrap();
    graph.add_pin(instance, Direction::Output, "Done", PinType::exec()).unwrap();
    let after = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("After")));
    graph.connect(entry, PN_THEN, instance, "Exec").unwrap();
    graph.connect(instance, "Done", after, PN_EXECUTE).unwrap();

    let mut bp = door();
    bp.macro_graphs.push(body);
    bp.function_graphs.push(graph);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);
    let script = &output.class.find_own_function("Run").unwrap().script;
    assert_eq!(calls(script), vec!["Inner".to_string(), "After".to_string()]);
}

#[test]
fn test_recompile_is_stable() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("Speed", PinType::float()));
    bp.new_variables
        .push(VariableDescription::new("LastDelta", PinType::float()));
    let (page, _, _) = event_page();
    bp.ubergraph_pages.push(page);
    bp.function_graphs.push(simple_function("Open", "PlaySound"));

    let first = compile_blueprint(&mut bp, CompileOptions::full());
    assert_eq!(first.log.num_warnings, 1);
    let second = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(second.succeeded());
    assert_eq!(second.log.num_warnings, 0);
    assert_eq!(first.class.describe(), second.class.describe());
    assert_eq!(first.class.default_object, second.class.default_object);
}

#[test]
fn test_compiles_are_deterministic() {
    init_tracing();
    let build = || {
        let mut bp = door();
        bp.new_variables
            .push(VariableDescription::new("LastDelta", PinType::float()).with_default("0.25"));
        let (page, _, _) = event_page();
        bp.ubergraph_pages.push(page);
        bp.function_graphs.push(simple_function("Open", "PlaySound"));
        bp
    };
    let mut a = build();
    let mut b = build();
    let first = compile_blueprint(&mut a, CompileOptions::full());
    let second = compile_blueprint(&mut b, CompileOptions::full());
    assert_eq!(
        serde_json::to_string(&first.class).unwrap(),
        serde_json::to_string(&second.class).unwrap()
    );
}

#[test]
fn test_skeleton_compile_keeps_signatures_without_code() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("LastDelta", PinType::float()));
    let (page, _, _) = event_page();
    bp.ubergraph_pages.push(page);
    bp.function_graphs.push(simple_function("Open", "PlaySound"));

    let output = compile_blueprint(&mut bp, CompileOptions::skeleton_only());
    assert!(output.succeeded(), "{:?}", output.log.messages);
    for function in &output.class.functions {
        assert_eq!(function.script, vec![ScriptOp::Return], "{}", function.name);
    }
    let tick = output.class.find_own_function("ReceiveTick").unwrap();
    assert_eq!(tick.parameters().count(), 1);
    assert!(output.class.find_own_function("Open").is_some());
}

#[test]
fn test_timeline_becomes_component_and_internal_events() {
    init_tracing();
    let mut bp = door();
    let mut fade = TimelineTemplate::new("Fade");
    fade.float_tracks.push("Alpha".into());
    bp.timelines.push(fade.clone());

    let mut page = Graph::new("EventGraph");
    let begin = page.spawn_node(NodeKind::Event(EventData::overriding("ReceiveBeginPlay", "Actor")));
    let timeline = page.spawn_node(NodeKind::Timeline {
        timeline: "Fade".into(),
    });
    page.add_pin(timeline, Direction::Output, "Alpha", PinType::float())
        .unwrap();
    let print = page.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
    page.connect(begin, PN_THEN, timeline, "Play").unwrap();
    page.connect(timeline, "Update", print, PN_EXECUTE).unwrap();
    bp.ubergraph_pages.push(page);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let component = output.class.find_own_property("Fade").unwrap();
    assert_eq!(component.ty, PinType::object("TimelineComponent"));
    assert!(output.class.find_own_property(&fade.direction_property_name()).is_some());
    assert!(output.class.find_own_property(&fade.track_property_name("Alpha")).is_some());

    for name in [fade.update_function_name(), fade.finished_function_name()] {
        let function = output.class.find_own_function(&name).unwrap();
        assert!(function.flags.contains(FunctionFlags::BLUEPRINT_EVENT));
        assert!(!function.flags.contains(FunctionFlags::BLUEPRINT_CALLABLE));
    }

    let uber = &output.class.find_own_function("ExecuteUbergraph_Door").unwrap().script;
    assert!(uber.iter().any(|op| matches!(
        op,
        ScriptOp::CallFunction { function, context: Some(Operand::Instance(owner)), .. }
            if function == "Play" && owner == "Fade"
    )));
    assert!(calls(uber).contains(&"Print".to_string()));
}

#[test]
fn test_verbose_compile_notes_the_class_layout() {
    init_tracing();
    let mut bp = door();
    bp.function_graphs.push(simple_function("Open", "PlaySound"));
    let mut options = CompileOptions::full();
    options.verbose = true;

    let output = compile_blueprint(&mut bp, options);
    let notes: Vec<_> = output
        .log
        .messages
        .iter()
        .filter(|m| m.severity == Severity::Note)
        .collect();
    assert!(notes[0].text.starts_with("Class Door_C : Actor"));
    assert!(notes.iter().any(|m| m.text.contains("function Open")));
    assert!(output.succeeded());
}

#[test]
fn test_overlapping_compiles_are_refused() {
    init_tracing();
    let mut session = CompileSession::new();
    session.begin("Window").unwrap();

    let mut bp = door();
    let result = session.compile_blueprint(&mut bp, CompileOptions::full());
    assert!(matches!(
        result,
        Err(CompileError::ReentrantCompile { ref active, ref requested })
            if active == "Window" && requested == "Door"
    ));
    assert!(bp.generated_class.is_none());

    session.end();
    let output = session.compile_blueprint(&mut bp, CompileOptions::full()).unwrap();
    assert!(output.succeeded());
    assert_eq!(session.compiled_count(), 2);
    assert!(!session.is_compiling());
}

#[test]
fn test_duplicate_declarations_rename_the_second() {
    init_tracing();
    let mut bp = pbcc::Blueprint::new("Crate", std::sync::Arc::new(pbcc::Class::new("Object", None)));
    bp.new_variables
        .push(VariableDescription::new("Speed", PinType::float()));
    bp.new_variables
        .push(VariableDescription::new("Speed", PinType::int()));

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert_eq!(output.log.num_warnings, 1);
    assert_eq!(bp.new_variables[0].name, "Speed");
    assert_eq!(bp.new_variables[1].name, "Speed_1");
    assert_eq!(output.class.find_own_property("Speed").unwrap().ty, PinType::float());
    assert_eq!(output.class.find_own_property("Speed_1").unwrap().ty, PinType::int());
}

#[test]
fn test_entry_wired_to_return_compiles_to_a_return() {
    init_tracing();
    let mut graph = Graph::new("Noop");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let result = graph.spawn_node(NodeKind::FunctionResult);
    graph.connect(entry, PN_THEN, result, PN_EXECUTE).unwrap();
    let mut bp = door();
    bp.function_graphs.push(graph);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert_eq!(output.log.num_errors, 0);
    let script = &output.class.find_own_function("Noop").unwrap().script;
    assert_eq!(code_only(script), vec![ScriptOp::Return]);
}

#[test]
fn test_delegate_signatures_compile_first_and_bind_to_their_property() {
    init_tracing();
    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("OnOpened", PinType::multicast_delegate()));
    bp.new_variables
        .push(VariableDescription::new("OnLocked", PinType::multicast_delegate()));
    bp.function_graphs.push(simple_function("Open", "PlaySound"));
    for name in ["OnOpened", "OnClosed"] {
        let mut signature = Graph::new(name);
        let entry = signature.spawn_node(NodeKind::FunctionEntry(Default::default()));
        signature
            .add_pin(entry, Direction::Output, "Opener", PinType::object("Actor"))
            .unwrap();
        bp.delegate_signature_graphs.push(signature);
    }

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let position = |name: &str| output.class.functions.iter().position(|f| f.name == name).unwrap();
    assert!(position("OnOpened__DelegateSignature") < position("Open"));
    assert!(position("OnClosed__DelegateSignature") < position("Open"));

    let signature = output.class.find_own_function("OnOpened__DelegateSignature").unwrap();
    assert!(signature.flags.contains(FunctionFlags::DELEGATE));
    assert_eq!(signature.num_parms, 1);
    assert_eq!(
        output.class.find_own_property("OnOpened").unwrap().signature_function.as_deref(),
        Some("OnOpened__DelegateSignature")
    );

    let warnings: Vec<_> = output.log.warnings().map(|m| m.text.as_str()).collect();
    assert_eq!(warnings.len(), 2, "{:?}", warnings);
    assert!(warnings
        .iter()
        .any(|w| w.contains("has no multicast delegate property named OnClosed")));
    assert!(warnings
        .iter()
        .any(|w| w.contains("Multicast delegate property OnLocked has no signature function")));
}

#[test]
fn test_interface_events_without_a_graph_get_stubs() {
    init_tracing();
    let mut interactable = Class::new("Interactable", None);
    interactable.flags |= ClassFlags::INTERFACE;
    interactable
        .add_function(Function::new("Interact", FunctionFlags::BLUEPRINT_EVENT))
        .unwrap();
    let mut gadget = Class::new("Gadget", None);
    gadget
        .add_function(Function::new("Poke", FunctionFlags::BLUEPRINT_EVENT))
        .unwrap();

    let mut bp = door();
    bp.new_variables
        .push(VariableDescription::new("LastDelta", PinType::float()));
    for interface in [interactable, gadget] {
        bp.implemented_interfaces.push(ImplementedInterface {
            interface: Arc::new(interface),
            graphs: Vec::new(),
        });
    }
    let (page, _, _) = event_page();
    bp.ubergraph_pages.push(page);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let interact = output.class.find_own_function("Interact").unwrap();
    assert!(interact.flags.contains(FunctionFlags::EVENT));
    assert_eq!(interact.super_function.as_deref(), Some("Interactable::Interact"));
    assert!(calls(&interact.script).contains(&"ExecuteUbergraph_Door".to_string()));

    // the invalid interface is skipped with a warning
    assert!(output.class.find_own_function("Poke").is_none());
    assert_eq!(output.class.interfaces.len(), 1);
    let warnings: Vec<_> = output.log.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.starts_with("'Gadget' is not an interface"));
}

#[test]
fn test_rep_notify_must_name_a_parameterless_function() {
    init_tracing();
    let mut bp = door();
    let mut health = VariableDescription::new("Health", PinType::float());
    health.rep_notify_func = Some("OnRep_Health".into());
    let mut armor = VariableDescription::new("Armor", PinType::float());
    armor.rep_notify_func = Some("OnRep_Armor".into());
    bp.new_variables.extend([health, armor]);
    bp.function_graphs.push(simple_function("OnRep_Armor", "PlaySound"));

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(output.succeeded(), "{:?}", output.log.messages);

    let health = output.class.find_own_property("Health").unwrap();
    assert_eq!(health.rep_notify, None);
    assert!(!health.flags.contains(PropertyFlags::REP_NOTIFY));
    assert!(health.flags.contains(PropertyFlags::NET));
    let armor = output.class.find_own_property("Armor").unwrap();
    assert_eq!(armor.rep_notify.as_deref(), Some("OnRep_Armor"));
    assert!(armor.flags.contains(PropertyFlags::REP_NOTIFY));

    let warnings: Vec<_> = output.log.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("OnRep function 'OnRep_Health'"));
}

/// Entry -> `Print(Add(2.0))` repeated `consumers` times.
fn shared_pure_value(consumers: usize) -> Graph {
    let mut graph = Graph::new("Report");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let add = graph.spawn_node(NodeKind::CallFunction(CallData::library("Add", "Math", true)));
    let a = graph.add_pin(add, Direction::Input, "A", PinType::float()).unwrap();
    graph.pin_mut(a).unwrap().default_value = "2.0".into();
    graph.add_pin(add, Direction::Output, "ReturnValue", PinType::float())
        .unwrap();

    let mut previous = entry;
    for _ in 0..consumers {
        let print = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
        graph.add_pin(print, Direction::Input, "Value", PinType::float())
            .unwrap();
        graph.connect(add, "ReturnValue", print, "Value").unwrap();
        graph.connect(previous, PN_THEN, print, PN_EXECUTE).unwrap();
        previous = print;
    }
    graph
}

#[test]
fn test_pure_node_is_inlined_once_per_consumer() {
    init_tracing();
    for consumers in 0..4 {
        let mut bp = door();
        bp.function_graphs.push(shared_pure_value(consumers));
        let output = compile_blueprint(&mut bp, CompileOptions::full());
        assert!(output.succeeded(), "{:?}", output.log.messages);

        let script = &output.class.find_own_function("Report").unwrap().script;
        let called = calls(script);
        assert_eq!(called.iter().filter(|f| *f == "Add").count(), consumers);
        assert_eq!(called.iter().filter(|f| *f == "Print").count(), consumers);
    }
}

#[test]
fn test_unparsable_pin_default_is_a_warning() {
    init_tracing();
    let mut graph = Graph::new("Count");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let print = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
    graph.connect(entry, PN_THEN, print, PN_EXECUTE).unwrap();
    let value = graph.add_pin(print, Direction::Input, "Value", PinType::int()).unwrap();
    graph.pin_mut(value).unwrap().default_value = "twelve".into();
    let mut bp = door();
    bp.function_graphs.push(graph);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert_eq!(output.log.num_errors, 0);
    let warnings: Vec<_> = output.log.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].text.contains("'twelve' is not a valid"));
}

#[test]
fn test_undetermined_wildcard_fails_the_compile() {
    init_tracing();
    let mut graph = Graph::new("Show");
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let print = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
    graph.connect(entry, PN_THEN, print, PN_EXECUTE).unwrap();
    graph.add_pin(print, Direction::Input, "Value", PinType::wildcard())
        .unwrap();
    let mut bp = door();
    bp.function_graphs.push(graph);

    let output = compile_blueprint(&mut bp, CompileOptions::full());
    assert!(!output.succeeded());
    let errors: Vec<_> = output.log.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].text.contains("is undetermined"));
}
