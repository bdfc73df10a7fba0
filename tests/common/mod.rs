// Test utility module for codegauge integration tests
#![allow(dead_code)]

use codegauge::{InMemoryClass, InMemoryCodebase, InMemoryFile, InMemoryFunction};
use indoc::indoc;

/// Route log output through the test harness
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small mixed-language project exercising every granularity: free
/// functions, a class hierarchy spanning files, a test file, and more
/// than one language.
pub fn sample_codebase() -> InMemoryCodebase {
    InMemoryCodebase::new("sample")
        .with_revision("rev-42")
        .with_file(shapes_file())
        .with_file(handlers_file())
        .with_file(util_file())
        .with_file(test_file())
}

/// Python file declaring the base of the inheritance chain plus a free
/// function
pub fn shapes_file() -> InMemoryFile {
    let free_fn = InMemoryFunction::new(
        "area_of",
        "src/shapes.py",
        indoc! {r#"
            def area_of(shape):
                if shape is None:
                    return 0
                return shape.area()
        "#},
    )
    .with_lines(8, 11)
    .with_parameter_count(1);

    let area_method = InMemoryFunction::new(
        "area",
        "src/shapes.py",
        "def area(self):\n    return 0\n",
    )
    .with_lines(4, 5)
    .with_parameter_count(1);

    let shape_class = InMemoryClass::new(
        "Shape",
        "src/shapes.py",
        indoc! {r#"
            class Shape:
                """Base shape."""

                def area(self):
                    return 0
        "#},
    )
    .with_lines(1, 5)
    .with_method(area_method);

    InMemoryFile::new(
        "src/shapes.py",
        indoc! {r#"
            class Shape:
                """Base shape."""

                def area(self):
                    return 0


            def area_of(shape):
                if shape is None:
                    return 0
                return shape.area()
        "#},
    )
    .with_class(shape_class)
    .with_function(free_fn)
}

/// Python file with the rest of the chain: Circle(Shape), Ring(Circle),
/// Disk(Ring)
pub fn handlers_file() -> InMemoryFile {
    let circle = InMemoryClass::new(
        "Circle",
        "src/handlers.py",
        indoc! {r#"
            class Circle(Shape):
                def area(self):
                    return 3.14159 * self.r * self.r
        "#},
    )
    .with_base_types(vec!["Shape".to_string()])
    .with_method(
        InMemoryFunction::new(
            "area",
            "src/handlers.py",
            "def area(self):\n    return 3.14159 * self.r * self.r\n",
        )
        .with_parameter_count(1),
    );

    let ring = InMemoryClass::new(
        "Ring",
        "src/handlers.py",
        indoc! {r#"
            class Ring(Circle):
                def area(self):
                    if self.inner > self.outer:
                        return 0
                    return outer_area - inner_area
        "#},
    )
    .with_base_types(vec!["Circle".to_string()]);

    let disk = InMemoryClass::new("Disk", "src/handlers.py", "class Disk(Ring):\n    pass\n")
        .with_base_types(vec!["Ring".to_string()]);

    InMemoryFile::new(
        "src/handlers.py",
        indoc! {r#"
            class Circle(Shape):
                def area(self):
                    return 3.14159 * self.r * self.r


            class Ring(Circle):
                def area(self):
                    if self.inner > self.outer:
                        return 0
                    return outer_area - inner_area


            class Disk(Ring):
                pass
        "#},
    )
    .with_class(circle)
    .with_class(ring)
    .with_class(disk)
}

/// A JavaScript utility file with two free functions
pub fn util_file() -> InMemoryFile {
    InMemoryFile::new(
        "src/util.js",
        indoc! {r#"
            // small helpers
            function clamp(x, lo, hi) {
                if (x < lo) {
                    return lo;
                }
                return x > hi ? hi : x;
            }

            function sum(xs) {
                let total = 0;
                for (const x of xs) {
                    total += x;
                }
                return total;
            }
        "#},
    )
    .with_function(
        InMemoryFunction::new(
            "clamp",
            "src/util.js",
            indoc! {r#"
                function clamp(x, lo, hi) {
                    if (x < lo) {
                        return lo;
                    }
                    return x > hi ? hi : x;
                }
            "#},
        )
        .with_lines(2, 7)
        .with_parameter_count(3),
    )
    .with_function(
        InMemoryFunction::new(
            "sum",
            "src/util.js",
            indoc! {r#"
                function sum(xs) {
                    let total = 0;
                    for (const x of xs) {
                        total += x;
                    }
                    return total;
                }
            "#},
        )
        .with_lines(9, 15)
        .with_parameter_count(1),
    )
}

/// A test file, recognizable from its path
pub fn test_file() -> InMemoryFile {
    InMemoryFile::new(
        "tests/test_shapes.py",
        "def test_area():\n    assert area_of(None) == 0\n",
    )
    .with_function(InMemoryFunction::new(
        "test_area",
        "tests/test_shapes.py",
        "def test_area():\n    assert area_of(None) == 0\n",
    ))
}
