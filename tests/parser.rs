#[cfg(test)]
mod parser_tests {
    use rlox_tree as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::expr::Expr;
    use lox::parser::Parser;
    use lox::scanner::scan_tokens;
    use lox::stmt::{FunctionKind, Stmt};

    fn parse_program(source: &str) -> (Vec<Stmt<'_>>, Vec<LoxError>) {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty(), "lex errors: {:?}", errors);
        Parser::new(&tokens).parse()
    }

    fn print_expression(source: &str) -> String {
        let (tokens, _) = scan_tokens(source);
        let expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression should parse");
        AstPrinter::print(&expr)
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(print_expression("!true == false"), "(== (! true) false)");
        assert_eq!(print_expression("1 < 2 and 3 >= 4 or nil"), "(or (and (< 1.0 2.0) (>= 3.0 4.0)) nil)");
        assert_eq!(print_expression("- -1"), "(- (- 1.0))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print_expression("a = b = 3"), "(= a (= b 3.0))");
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(print_expression("f(1)(2)"), "(call (call f 1.0) 2.0)");
        assert_eq!(print_expression("a.b.c = 1"), "(set (. a b) c 1.0)");
        assert_eq!(print_expression("super.m"), "(super m)");
    }

    #[test]
    fn test_trailing_tokens_in_expression() {
        let (tokens, _) = scan_tokens("1 2");
        let errors = Parser::new(&tokens).parse_expression().unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '2': Expect end of expression."]
        );
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        let (_, errors) = parse_program("print 1");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_recovery_reports_every_statement() {
        let source = "var = 1;\nprint 2;\nprint (3;\nvar ok = 4;";
        let (statements, errors) = parse_program(source);

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect ')' after expression.",
            ]
        );

        // The statements around the broken ones still parse.
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[1], Stmt::Var { name, .. } if name.lexeme == "ok"));
    }

    #[test]
    fn test_invalid_assignment_target_does_not_unwind() {
        let (statements, errors) = parse_program("1 + 2 = 3; print 4;");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_too_many_arguments() {
        let arguments = vec!["1"; 256].join(", ");
        let source = format!("f({});", arguments);
        let (statements, errors) = parse_program(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .ends_with("Can't have more than 255 arguments."));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_for_desugars_to_while() {
        let (statements, errors) = parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(errors.is_empty());
        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));
        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected block body");
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_class_members() {
        let source = "class B < A { init(x) {} area { return 1; } class make() { return B(1); } }";
        let (statements, errors) = parse_program(source);

        assert!(errors.is_empty(), "{:?}", messages(&errors));
        let Stmt::Class(class) = &statements[0] else {
            panic!("expected class");
        };

        assert_eq!(class.name.lexeme, "B");
        assert!(matches!(&class.superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));

        let kinds: Vec<_> = class.methods.iter().map(|m| (m.name.lexeme, m.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("init", FunctionKind::Method),
                ("area", FunctionKind::Getter),
                ("make", FunctionKind::Static),
            ]
        );
        assert!(class.methods[0].is_initializer());
        assert!(class.methods[1].params.is_empty());
    }

    #[test]
    fn test_deeply_nested_expression() {
        let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));

        assert!(print_expression(&source).starts_with("(group (group"));
    }
}
