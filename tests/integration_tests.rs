//! 端到端集成测试
//!
//! 走完整流水线, 对生成的 C 文件内容做断言

use mijac::Compiler;

fn compile(source: &str) -> Vec<mijac::Artifact> {
    Compiler::new().compile(source).unwrap()
}

fn artifact<'a>(artifacts: &'a [mijac::Artifact], filename: &str) -> &'a str {
    &artifacts
        .iter()
        .find(|a| a.filename == filename)
        .unwrap_or_else(|| panic!("missing artifact {}", filename))
        .contents
}

#[test]
fn test_struct_layout_and_constructor() {
    let artifacts = compile(
        "class A {
             int x;
             public void m() { x = 42; }
         }",
    );

    let header = artifact(&artifacts, "A.h");
    assert!(header.contains("struct A {"));
    assert!(header.contains("\tint x;"));
    assert!(header.contains("void (*$_function_m)(void *);"));
    assert!(header.contains("A *$_new_A();"));

    let source = artifact(&artifacts, "A.c");
    assert!(source.contains("A *self = (A *) malloc(sizeof(A));"));
    assert!(source.contains("self->x = 0;"));
    assert!(source.contains("self->$_function_m = A_m;"));
    assert!(source.contains("super->x = 42;"));
}

#[test]
fn test_override_installs_subclass_method() {
    let artifacts = compile(
        "class B {
             public int f() { return 1; }
         }
         class C extends B {
             public int f() { return 2; }
         }",
    );

    let header = artifact(&artifacts, "C.h");
    assert!(header.contains("\tB super;"));

    let source = artifact(&artifacts, "C.c");
    assert!(source.contains("self->super.$_function_f = C_f;"));
    assert!(source.contains("self->$_function_f = C_f;"));
}

#[test]
fn test_grandparent_field_access() {
    let artifacts = compile(
        "class A { int[] arr; }
         class B extends A { }
         class C extends B {
             public void set() { arr[2] = 4; }
         }",
    );

    let source = artifact(&artifacts, "C.c");
    assert!(source.contains("super->super.super.arr->data[2] = 4;"));
}

#[test]
fn test_println_lowers_to_printf() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 System.out.println(41 + 1);
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("int main()"));
    assert!(source.contains("int $_t_0 = 41 + 1;"));
    assert!(source.contains("printf(\"%d\\n\", $_t_0);"));
}

#[test]
fn test_for_loop_with_break() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 for (int i = 0; i < 10; i++) {
                     if (i == 5) { break; }
                     System.out.print(i);
                 }
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("for_start_0:;"));
    assert!(source.contains("for_update_0:;"));
    assert!(source.contains("goto for_end_0;"));
    assert!(source.contains("goto for_start_0;"));
}

#[test]
fn test_method_call_through_function_pointer() {
    let artifacts = compile(
        "class Counter {
             int value;
             public int next() {
                 value = value + 1;
                 return value;
             }
         }
         class Main {
             public static void main(String[] args) {
                 Counter c;
                 c = new Counter();
                 System.out.println(c.next());
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("Counter *$_t_0 = $_new_Counter();"));
    assert!(source.contains("c->$_function_next(c)"));
}

#[test]
fn test_unsigned_shift_right() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 int x;
                 x = 0 - 8;
                 System.out.println(x >>> 1);
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("(int) ((unsigned int) (x) >> 1)"));
}

#[test]
fn test_new_int_array() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 int[] a;
                 a = new int[10];
                 a[0] = 7;
                 System.out.println(a.length);
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("__int_array *$_t_0 = $_new___int_array(10);"));
    assert!(source.contains("a->data[0] = 7;"));
    assert!(source.contains("a->length"));
}

#[test]
fn test_braceless_bodies_compile() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 int x;
                 x = 5;
                 if (x > 3) x = 3; else x = 4;
                 while (x > 0) x -= 1;
                 do x += 1; while (x < 2);
                 for (int i = 0; i < 2; i++) x = x + i;
                 System.out.println(x);
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("if_else_0:;"));
    assert!(source.contains("while_end_0:;"));
    assert!(source.contains("while_start_1:;"));
    assert!(source.contains("for_body_0:;"));
    assert!(source.contains("x -= 1;"));
}

#[test]
fn test_inner_block_shadowing_keeps_outer_type() {
    let artifacts = compile(
        "class Helper {
             public int id() { return 7; }
         }
         class Main {
             public static void main(String[] args) {
                 Helper h;
                 h = new Helper();
                 {
                     int h;
                     h = 1;
                 }
                 System.out.println(h.id());
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("h->$_function_id(h)"));
}

#[test]
fn test_cyclic_inheritance_rejected() {
    let err = Compiler::new()
        .compile("class A extends B { } class B extends A { }")
        .unwrap_err();
    assert!(err.to_string().contains("Cyclic inheritance detected"));
}

#[test]
fn test_break_outside_loop_rejected() {
    let err = Compiler::new()
        .compile("class Main { public static void main(String[] args) { break; } }")
        .unwrap_err();
    assert!(err.to_string().contains("break statement must be called inside a loop"));
}

#[test]
fn test_runtime_artifacts_always_present() {
    let artifacts = compile("class A { }");
    assert!(artifacts.iter().any(|a| a.filename == "__int_array.h"));
    assert!(artifacts.iter().any(|a| a.filename == "__int_array.c"));
    assert!(artifacts.iter().any(|a| a.filename == "CMakeLists.txt"));
    let cmake = artifact(&artifacts, "CMakeLists.txt");
    assert!(cmake.contains("set(CMAKE_C_STANDARD 99)"));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "class A { int x; }
         class B extends A {
             public int get() { return x; }
         }
         class Main {
             public static void main(String[] args) {
                 B b;
                 b = new B();
                 System.out.println(b.get());
             }
         }";
    let first = compile(source);
    let second = compile(source);
    assert_eq!(first, second);
}

#[test]
fn test_do_while_and_continue() {
    let artifacts = compile(
        "class Main {
             public static void main(String[] args) {
                 int i;
                 i = 0;
                 do {
                     i += 1;
                     if (i == 2) { continue; }
                     System.out.print(i);
                 } while (i < 5);
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("while_start_0:;"));
    assert!(source.contains("goto while_start_0;"));
    assert!(source.contains("i += 1;"));
}

#[test]
fn test_cast_between_related_classes() {
    let artifacts = compile(
        "class Animal {
             public int legs() { return 4; }
         }
         class Dog extends Animal { }
         class Main {
             public static void main(String[] args) {
                 Animal a;
                 Dog d;
                 a = new Dog();
                 d = (Dog) a;
                 System.out.println(d.legs());
             }
         }",
    );

    let source = artifact(&artifacts, "Main.c");
    assert!(source.contains("= (Dog *) a;"));
}

#[test]
fn test_write_artifacts_to_dir() {
    let dir = std::env::temp_dir().join("mijac_integration_out");
    let _ = std::fs::remove_dir_all(&dir);

    Compiler::new()
        .compile_to_dir(
            "class Main {
                 public static void main(String[] args) {
                     System.out.println(1);
                 }
             }",
            &dir,
        )
        .unwrap();

    assert!(dir.join("Main.c").exists());
    assert!(dir.join("Main.h").exists());
    assert!(dir.join("__int_array.c").exists());
    assert!(dir.join("CMakeLists.txt").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
