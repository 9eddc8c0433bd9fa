//! Tests for code generation in both target languages.
mod common;
use common::*;
use tsunagi::compiler::templates::render;
use tsunagi::compiler::RUNTIME_CALLBACKS;
use tsunagi::prelude::*;

/// `x` declared mutable with 5, then `x = x + 1`.
fn increment_session() -> (Session, BlockId, BlockId) {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("x", DataType::Int, true));
    nest(ws, main, ConnectorRole::FunctionBody, init);
    let five = create(ws, int(5));
    plug(ws, init, ConnectorRole::Input, 0, five);

    let set = create(ws, BlockData::VarSet);
    append(ws, init, set);
    let target = create(ws, variable("x"));
    plug(ws, set, ConnectorRole::Target, 0, target);
    let add = create(ws, math(MathOp::Add, DataType::Int));
    plug(ws, set, ConnectorRole::Input, 0, add);
    let read = create(ws, variable("x"));
    plug(ws, add, ConnectorRole::Input, 0, read);
    let one = create(ws, int(1));
    plug(ws, add, ConnectorRole::Input, 1, one);

    session.flush().expect("Failed to flush events");
    (session, init, set)
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, code))
}

#[test]
fn test_hello_world_javascript() {
    let (session, _, print) = hello_session();
    let result = session
        .compile(TargetLanguage::JavaScript)
        .expect("Failed to compile");

    let expected = format!(
        "async function main() {{\n  __markExecuting(\"{}\");\n  await __delay();\n  console.log(\"hi\");\n}}",
        print
    );
    assert_eq!(result.code, expected);
    assert_eq!(result.entrypoint, "main");
    assert_eq!(result.arg_names, RUNTIME_CALLBACKS.map(String::from).to_vec());
}

#[test]
fn test_hello_world_reason() {
    let (session, _, print) = hello_session();
    let result = session
        .compile(TargetLanguage::ReasonML)
        .expect("Failed to compile");
    let code = &result.code;

    assert!(code.starts_with("[@bs.val] external markExecuting"));
    assert!(code.contains("let rec main = (resolve) => {"));
    assert_eq!(code.matches("Js.log(").count(), 1);
    assert!(code.contains("Js.log(\"hi\");"));
    assert!(code.contains(&format!("markExecuting(\"{}\");\n  delay(() => {{", print)));
    // The continuation runs once, after the last statement.
    assert_eq!(code.matches("resolve(())").count(), 1);
    assert!(position(code, "Js.log(") < position(code, "resolve(())"));
}

#[test]
fn test_mutable_declaration_precedes_use() {
    let (session, init, set) = increment_session();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(position(&js, "let x = 5;") < position(&js, "x = (x + 1);"));
    assert!(
        position(&js, &format!("__markExecuting(\"{}\")", init))
            < position(&js, &format!("__markExecuting(\"{}\")", set))
    );

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(position(&reason, "let x = ref(5);") < position(&reason, "x := (x^ + 1);"));
}

#[test]
fn test_immutable_declaration() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("name", DataType::String, false));
    nest(ws, main, ConnectorRole::FunctionBody, init);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("const name = \"\";"));
    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(reason.contains("let name = \"\";"));
}

#[test]
fn test_compilation_is_deterministic() {
    let (session, _, _) = increment_session();
    for target in [TargetLanguage::JavaScript, TargetLanguage::ReasonML] {
        let first = session.compile(target).unwrap();
        let second = session.compile(target).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_absent_inputs_compile_to_defaults() {
    let mut ws = Workspace::default();
    let junction = create(&mut ws, BlockData::LogicJunction { op: JunctionOp::And });
    let divide = create(&mut ws, math(MathOp::Divide, DataType::Int));
    let sum = create(&mut ws, math(MathOp::Add, DataType::Float));
    let compare = create(&mut ws, BlockData::LogicComparison { op: ComparisonOp::NotEqual });

    let js = Compiler::new(TargetLanguage::JavaScript);
    let reason = Compiler::new(TargetLanguage::ReasonML);
    let props = CompileProps::default;

    assert_eq!(js.compile_block(&ws, junction, props()).unwrap(), "(false && false)");
    assert_eq!(js.compile_block(&ws, divide, props()).unwrap(), "Math.trunc(0 / 0)");
    assert_eq!(js.compile_block(&ws, compare, props()).unwrap(), "(undefined !== undefined)");
    assert_eq!(reason.compile_block(&ws, sum, props()).unwrap(), "(0.0 +. 0.0)");
    assert_eq!(reason.compile_block(&ws, compare, props()).unwrap(), "(() != ())");
}

#[test]
fn test_literals() {
    let mut ws = Workspace::default();
    let list = create(&mut ws, value(DataType::Array(Box::new(DataType::Int)), "[1, 2, 3]"));
    let quoted = create(&mut ws, string("say \"hi\""));
    let flag = create(&mut ws, value(DataType::Bool, "yes"));
    let broken = create(&mut ws, value(DataType::Int, "abc"));

    let js = Compiler::new(TargetLanguage::JavaScript);
    let reason = Compiler::new(TargetLanguage::ReasonML);

    assert_eq!(js.compile_block(&ws, list, CompileProps::default()).unwrap(), "[1, 2, 3]");
    assert_eq!(reason.compile_block(&ws, list, CompileProps::default()).unwrap(), "[|1, 2, 3|]");
    assert_eq!(
        js.compile_block(&ws, quoted, CompileProps::default()).unwrap(),
        "\"say \\\"hi\\\"\""
    );
    assert_eq!(js.compile_block(&ws, flag, CompileProps::default()).unwrap(), "true");
    assert_eq!(js.compile_block(&ws, broken, CompileProps::default()).unwrap(), "0");
}

#[test]
fn test_non_finite_floats_compile_to_zero() {
    let mut ws = Workspace::default();
    let js = Compiler::new(TargetLanguage::JavaScript);
    let reason = Compiler::new(TargetLanguage::ReasonML);
    for raw in ["inf", "-inf", "NaN", "infinity"] {
        let float = create(&mut ws, value(DataType::Float, raw));
        assert_eq!(js.compile_block(&ws, float, CompileProps::default()).unwrap(), "0.0");
        assert_eq!(reason.compile_block(&ws, float, CompileProps::default()).unwrap(), "0.0");
    }
    let any = create(&mut ws, value(DataType::Any, "inf"));
    assert_eq!(js.compile_block(&ws, any, CompileProps::default()).unwrap(), "\"inf\"");
}

#[test]
fn test_reserved_rename_keeps_generated_code_valid() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("x", DataType::Int, false));
    nest(ws, main, ConnectorRole::FunctionBody, init);
    session.flush().expect("Failed to flush events");

    for name in ["resolve", "class", "open"] {
        let renamed = session
            .workspace_mut()
            .update_data(init, |d| *d = var_init(name, DataType::Int, false));
        assert!(matches!(renamed, Err(GraphError::InvalidData { .. })));
    }

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(reason.contains("let x = 0;"));
    assert!(!reason.contains("let resolve"));
    assert_eq!(reason.matches("resolve(())").count(), 1);
    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("const x = 0;"));
}

#[test]
fn test_resolve_function_is_appended_once_at_the_tail() {
    let mut ws = Workspace::default();
    let first = create(&mut ws, comment("first"));
    let second = create(&mut ws, comment("second"));
    append(&mut ws, first, second);

    let props = CompileProps {
        resolve_function: Some("done()".to_string()),
    };
    let code = Compiler::new(TargetLanguage::ReasonML)
        .compile_block(&ws, first, props)
        .unwrap();
    assert_eq!(code, "/* first */\n/* second */\ndone()");
}

#[test]
fn test_loop_javascript() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let looped = create(ws, BlockData::Loop);
    nest(ws, main, ConnectorRole::FunctionBody, looped);
    let flag = create(ws, value(DataType::Bool, "true"));
    plug(ws, looped, ConnectorRole::Conditional, 0, flag);
    let note = create(ws, comment("again"));
    nest(ws, looped, ConnectorRole::LoopInner, note);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("while (true) {\n    await __delay();\n    // again\n  }"));
}

#[test]
fn test_loop_reason_recurses_from_body_tail() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let looped = create(ws, BlockData::Loop);
    nest(ws, main, ConnectorRole::FunctionBody, looped);
    let print = create(ws, println());
    nest(ws, looped, ConnectorRole::LoopInner, print);
    session.flush().unwrap();

    let code = session.compile(TargetLanguage::ReasonML).unwrap().code;
    let recur = format!("loop_{}()", looped);
    assert!(code.contains(&format!("let rec loop_{} = () => {{", looped)));
    assert!(code.contains(&format!("loop_{}();", looped)));
    // Body tail calls the loop again; the else branch resolves the function.
    assert!(position(&code, "Js.log(\"\");") < position(&code, &format!("{}\n", recur)));
    assert!(code.contains("if (false) {"));
    assert_eq!(code.matches("resolve(())").count(), 1);
}

#[test]
fn test_conditional_branches() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let branch = create(ws, BlockData::Conditional);
    nest(ws, main, ConnectorRole::FunctionBody, branch);
    let yes = create(ws, comment("yes"));
    nest(ws, branch, ConnectorRole::IfTrue, yes);
    let after_branch = create(ws, comment("after"));
    append(ws, branch, after_branch);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("if (false) {\n    // yes\n  }\n  // after"));
    assert!(!js.contains("else"));

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    let next = format!("next_{}()", branch);
    assert!(reason.contains(&format!("let next_{} = () => {{\n    /* after */\n    resolve(())\n  }};", branch)));
    // Both branches continue with the statements after the conditional.
    assert_eq!(reason.matches(&next).count(), 2);
}

#[test]
fn test_function_returns_value() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let answer = on_canvas(ws, function_with("answer", &[("n", DataType::Int)], DataType::Int));
    let forty_two = create(ws, int(42));
    plug(ws, answer, ConnectorRole::Return, 0, forty_two);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap();
    assert_eq!(js.code, "async function answer(n) {\n  return 42;\n}");
    assert_eq!(js.entrypoint, "answer");

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(reason.contains("let rec answer = (n, resolve) => {\n  resolve(42)\n};"));
}

#[test]
fn test_reason_hoists_value_invocations() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    on_canvas(ws, function_with("get", &[], DataType::Int));
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("y", DataType::Int, false));
    nest(ws, main, ConnectorRole::FunctionBody, init);
    let call = create(ws, invoke("get", DataType::Int));
    plug(ws, init, ConnectorRole::Input, 0, call);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("const y = (await get());"));

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    let binding = format!("r_{}", call);
    assert!(reason.contains(&format!("get(({}) => {{", binding)));
    assert!(position(&reason, &format!("get(({})", binding)) < position(&reason, &format!("let y = {};", binding)));
    assert!(reason.contains("\nand main = (resolve) => {"));
}

#[test]
fn test_statement_invocation() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    on_canvas(ws, function_with("greet", &[("who", DataType::String)], DataType::Void));
    let main = on_canvas(ws, function("main"));
    let call = create(ws, invoke("greet", DataType::Void));
    nest(ws, main, ConnectorRole::FunctionBody, call);
    session.flush().unwrap();

    // The argument socket appears once the call is bound to its declaration.
    let ws = session.workspace_mut();
    let name = create(ws, string("Ada"));
    plug(ws, call, ConnectorRole::Argument, 0, name);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap();
    assert!(js.code.contains("await greet(\"Ada\");"));
    assert_eq!(js.entrypoint, "main");

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(reason.contains("greet(\"Ada\", (_) => {\n      resolve(())\n    })"));
}

#[test]
fn test_editable_expression_uses_target_source() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let raw = create(ws, editable(&[(TargetLanguage::JavaScript, "window.scrollTo(0, 0)")]));
    nest(ws, main, ConnectorRole::FunctionBody, raw);
    session.flush().unwrap();

    let js = session.compile(TargetLanguage::JavaScript).unwrap().code;
    assert!(js.contains("window.scrollTo(0, 0);"));

    let err = session.compile(TargetLanguage::ReasonML).unwrap_err();
    assert_eq!(
        err,
        CompileError::MissingSource {
            block: raw,
            target: TargetLanguage::ReasonML,
        }
    );
}

#[test]
fn test_template_without_target_form_fails() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let alert = create(ws, template(ExpressionTemplate::Alert));
    nest(ws, main, ConnectorRole::FunctionBody, alert);
    session.flush().unwrap();

    assert!(session.compile(TargetLanguage::JavaScript).unwrap().code.contains("alert(\"\");"));
    assert_eq!(
        session.compile(TargetLanguage::ReasonML).unwrap_err(),
        CompileError::MissingTemplate {
            template: ExpressionTemplate::Alert,
            target: TargetLanguage::ReasonML,
        }
    );
}

#[test]
fn test_non_void_expression_is_ignored_in_reason() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let length = create(ws, template(ExpressionTemplate::StringLength));
    nest(ws, main, ConnectorRole::FunctionBody, length);
    session.flush().unwrap();

    let reason = session.compile(TargetLanguage::ReasonML).unwrap().code;
    assert!(reason.contains("ignore(String.length(\"\"));"));
}

#[test]
fn test_root_block_is_unsupported() {
    let ws = Workspace::default();
    let err = Compiler::new(TargetLanguage::JavaScript)
        .compile_block(&ws, ws.root(), CompileProps::default())
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnsupportedBlock {
            block: ws.root(),
            block_type: BlockType::Root,
        }
    );
}

#[test]
fn test_entrypoint_selection() {
    let mut session = Session::new();
    assert_eq!(
        session.compile(TargetLanguage::JavaScript).unwrap_err(),
        CompileError::NoEntrypoint
    );

    let ws = session.workspace_mut();
    on_canvas(ws, comment("top-level comments are skipped"));
    on_canvas(ws, function("helper"));
    on_canvas(ws, function("other"));
    session.flush().unwrap();
    assert_eq!(session.compile(TargetLanguage::JavaScript).unwrap().entrypoint, "helper");

    on_canvas(session.workspace_mut(), function("main"));
    session.flush().unwrap();
    let result = session.compile(TargetLanguage::JavaScript).unwrap();
    assert_eq!(result.entrypoint, "main");
    assert_eq!(result.code.matches("async function").count(), 3);

    let compiler = Compiler::builder(TargetLanguage::JavaScript)
        .with_entrypoint("other")
        .build();
    assert_eq!(session.compile_with(&compiler).unwrap().entrypoint, "other");

    let compiler = Compiler::builder(TargetLanguage::JavaScript)
        .with_entrypoint("missing")
        .build();
    assert_eq!(
        session.compile_with(&compiler).unwrap_err(),
        CompileError::UnknownEntrypoint("missing".to_string())
    );
}

#[test]
fn test_indent_setting() {
    let (session, _, _) = hello_session();
    let compiler = Compiler::builder(TargetLanguage::JavaScript)
        .with_indent(4)
        .build();
    let code = session.compile_with(&compiler).unwrap().code;
    assert!(code.contains("\n    console.log(\"hi\");\n"));
}

#[test]
fn test_render_placeholders() {
    let inputs = vec!["a".to_string(), "b".to_string()];
    assert_eq!(render("f({{0}}, {{1}})", &inputs), "f(a, b)");
    assert_eq!(render("{{1}}{{1}}", &inputs), "bb");
    assert_eq!(render("keep {{7}}", &inputs), "keep {{7}}");
    assert_eq!(render("open {{0", &inputs), "open {{0");
}

#[test]
fn test_compilation_result_serializes_camel_case() {
    let (session, _, _) = hello_session();
    let result = session.compile(TargetLanguage::JavaScript).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["entrypoint"], "main");
    assert_eq!(json["argNames"][0], "__markExecuting");
}
