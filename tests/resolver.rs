#[cfg(test)]
mod resolver_tests {
    use std::collections::HashMap;

    use rlox_tree as lox;

    use lox::expr::{Expr, ExprId};
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::scan_tokens;
    use lox::stmt::Stmt;

    /// Resolve `source` into a bare distance table, or the diagnostics.
    fn resolve(source: &str) -> Result<HashMap<ExprId, usize>, Vec<String>> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());
        let (statements, errors) = Parser::new(&tokens).parse();
        assert!(errors.is_empty(), "parse errors: {:?}", errors);

        let mut table = HashMap::new();
        Resolver::new(&mut table)
            .resolve(&statements)
            .map_err(|errors| errors.iter().map(|e| e.to_string()).collect::<Vec<_>>())?;
        Ok(table)
    }

    fn diagnostics(source: &str) -> Vec<String> {
        resolve(source).expect_err("expected resolver diagnostics")
    }

    #[test]
    fn test_globals_are_not_recorded() {
        let table = resolve("var a = 1; print a; a = 2;").unwrap();

        assert!(table.is_empty());
    }

    #[test]
    fn test_local_distances() {
        let source = "{ var a = 1; { var b = 2; print a; print b; } }";
        let (tokens, _) = scan_tokens(source);
        let (statements, _) = Parser::new(&tokens).parse();

        let mut table = HashMap::new();
        Resolver::new(&mut table).resolve(&statements).unwrap();

        let Stmt::Block(outer) = &statements[0] else { panic!() };
        let Stmt::Block(inner) = &outer[1] else { panic!() };
        let Stmt::Print(Expr::Variable { id: a, .. }) = &inner[1] else { panic!() };
        let Stmt::Print(Expr::Variable { id: b, .. }) = &inner[2] else { panic!() };

        assert_eq!(table.get(a), Some(&1));
        assert_eq!(table.get(b), Some(&0));
    }

    #[test]
    fn test_closure_captures_declaration_scope() {
        // `a` inside show() is bound to the global, even after a later local shadow.
        let table = resolve(
            "var a = \"global\"; { fun show() { print a; } show(); var a = \"block\"; show(); }",
        )
        .unwrap();

        // Only `show` (twice, depth 0) is local.
        let mut depths: Vec<_> = table.values().copied().collect();
        depths.sort();
        assert_eq!(depths, vec![0, 0]);
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            diagnostics("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            diagnostics("fun f(a) { var a; }\n{ var b; var b; }"),
            vec![
                "[line 1] Error at 'a': Already a variable with this name in this scope.",
                "[line 2] Error at 'b': Already a variable with this name in this scope.",
            ]
        );

        // Globals may be redeclared.
        assert!(resolve("var g = 1; var g = 2;").is_ok());
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            diagnostics("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            diagnostics("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );

        assert!(resolve("class A { init() { return; } }").is_ok());
        assert!(resolve("class A { area { return 1; } }").is_ok());
    }

    #[test]
    fn test_this_and_super_placement() {
        assert_eq!(
            diagnostics("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            diagnostics("fun f() { super.m(); }"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            diagnostics("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
        assert_eq!(
            diagnostics("class A {} class B < A { class s() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a static method."]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            diagnostics("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_super_resolves_one_frame_above_this() {
        let source = "class A { m() {} } class B < A { m() { super.m(); } }";
        let (tokens, _) = scan_tokens(source);
        let (statements, _) = Parser::new(&tokens).parse();

        let mut table = HashMap::new();
        Resolver::new(&mut table).resolve(&statements).unwrap();

        let Stmt::Class(class) = &statements[1] else { panic!() };
        let Stmt::Expression(Expr::Call { callee, .. }) = &class.methods[0].body[0] else {
            panic!()
        };
        let Expr::Super { id, .. } = callee.as_ref() else { panic!() };

        // method body → this → super
        assert_eq!(table.get(id), Some(&2));
    }

    #[test]
    fn test_deeply_nested_scopes() {
        let depth = 100_000;
        let source = format!(
            "{{ var a = 1; {} print -({}a{}); {} }}",
            "{".repeat(depth),
            "(".repeat(depth),
            ")".repeat(depth),
            "}".repeat(depth)
        );

        let table = resolve(&source).unwrap();

        assert_eq!(table.values().copied().collect::<Vec<_>>(), vec![depth]);
    }
}
