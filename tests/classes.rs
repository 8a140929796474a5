#[cfg(test)]
mod classes_tests {
    use rlox_tree as lox;

    use lox::error::{LoxError, RuntimeError};
    use lox::interpreter::DEFAULT_MAX_CALL_DEPTH;

    fn run(source: &str) -> String {
        let mut out = Vec::new();
        if let Err(errors) = lox::run(source, &mut out, DEFAULT_MAX_CALL_DEPTH) {
            panic!("program failed: {:?}", errors);
        }
        String::from_utf8(out).unwrap()
    }

    fn runtime_error(source: &str) -> RuntimeError {
        let mut out = Vec::new();
        let mut errors = lox::run(source, &mut out, DEFAULT_MAX_CALL_DEPTH)
            .expect_err("program should fail");

        match errors.remove(0) {
            LoxError::Runtime(e) => e,
            other => panic!("expected runtime error, got {}", other),
        }
    }

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(run("class Bagel {} print Bagel; print Bagel();"), "Bagel\nBagel instance\n");
    }

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
            class Box {
                describe() { return "box of " + this.item; }
            }
            var b = Box();
            b.item = "tea";
            print b.describe();
            var m = b.describe;
            b.item = "cake";
            print m();
        "#;

        assert_eq!(run(source), "box of tea\nbox of cake\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(run(source), "field\n");
    }

    #[test]
    fn test_initializer_contract() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                    if (x > 100) return;
                    this.small = true;
                }
            }
            var p = Point(1, 2);
            print p.x + p.y;
            print p.small;
            var q = Point(200, 0);
            print q.init(1, 1) == q;
            print q.x;
        "#;

        assert_eq!(run(source), "3\ntrue\ntrue\n1\n");
    }

    #[test]
    fn test_class_arity_follows_init() {
        let e = runtime_error("class P { init(a) {} }\nP();");
        assert_eq!(e.to_string(), "[line 2] Error: Expected 1 arguments but got 0.");

        let e = runtime_error("class Q {}\nQ(1);");
        assert_eq!(e.to_string(), "[line 2] Error: Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class Doughnut {
                cook() { return "Fry until golden brown."; }
                name() { return "doughnut"; }
            }
            class BostonCream < Doughnut {
                cook() { return super.cook() + " Pipe full of custard."; }
            }
            var bc = BostonCream();
            print bc.cook();
            print bc.name();
        "#;

        assert_eq!(
            run(source),
            "Fry until golden brown. Pipe full of custard.\ndoughnut\n"
        );
    }

    #[test]
    fn test_super_is_bound_statically() {
        let source = r#"
            class A { method() { print "A method"; } }
            class B < A {
                method() { print "B method"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
        "#;

        assert_eq!(run(source), "A method\n");
    }

    #[test]
    fn test_inherited_initializer() {
        let source = r#"
            class Base { init(n) { this.n = n; } }
            class Derived < Base {}
            print Derived(7).n;
        "#;

        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn test_superclass_must_be_class() {
        let e = runtime_error("var NotAClass = \"x\";\nclass B < NotAClass {}");

        assert_eq!(e.to_string(), "[line 2] Error: Superclass must be a class.");
    }

    #[test]
    fn test_superclass_error_points_at_superclass_name() {
        let e = runtime_error("var NotAClass = 1;\nclass B <\n  NotAClass {}");

        assert_eq!(e.to_string(), "[line 3] Error: Superclass must be a class.");
    }

    #[test]
    fn test_undefined_property() {
        let e = runtime_error("class P {}\nprint P().nope;");

        assert_eq!(e.to_string(), "[line 2] Error: Undefined property 'nope' on P instance.");
    }

    #[test]
    fn test_property_access_on_non_instance() {
        let e = runtime_error("var s = \"str\"; print s.length;");
        assert_eq!(e.to_string(), "[line 1] Error: Only instances have properties.");

        let e = runtime_error("var n = 1; n.x = 2;");
        assert_eq!(e.to_string(), "[line 1] Error: Only instances have fields.");
    }

    #[test]
    fn test_getters() {
        let source = r#"
            class Circle {
                init(radius) { this.radius = radius; }
                area { return 3 * this.radius * this.radius; }
            }
            class Labelled < Circle {
                area { return "area " + "is"; }
                parent { return super.area; }
            }
            print Circle(2).area;
            var l = Labelled(1);
            print l.area;
            print l.parent;
        "#;

        assert_eq!(run(source), "12\narea is\n3\n");
    }

    #[test]
    fn test_static_methods() {
        let source = r#"
            class Math {
                class square(n) { return n * n; }
                class describe() { return this; }
            }
            print Math.square(3);
            print Math.describe();
        "#;

        assert_eq!(run(source), "9\nMath\n");
    }

    #[test]
    fn test_static_methods_are_inherited_and_not_on_instances() {
        let source = r#"
            class A { class make() { return "made"; } }
            class B < A {}
            print B.make();
        "#;
        assert_eq!(run(source), "made\n");

        let e = runtime_error("class A { class make() {} }\nA().make();");
        assert!(matches!(e, RuntimeError::UndefinedProperty { line: 2, .. }));
    }

    #[test]
    fn test_class_fields() {
        let source = r#"
            class Counter {
                class bump() { this.count = this.count + 1; return this.count; }
            }
            Counter.count = 0;
            Counter.bump();
            print Counter.bump();
        "#;

        assert_eq!(run(source), "2\n");
    }

    #[test]
    fn test_methods_close_over_class_name() {
        let source = r#"
            class Node {
                next() { return Node(); }
            }
            print Node().next();
        "#;

        assert_eq!(run(source), "Node instance\n");
    }
}
