pub mod style {
    use crossterm::style::{Color, Stylize};
    use once_cell::sync::Lazy;
    use std::fmt::{Display, Formatter};
    use std::io::IsTerminal;

    const UNKNOWN_PLACEHOLDER: &str = "???";

    /// Styles are dropped when output is not a terminal (pipes, test harness).
    static STYLED: Lazy<bool> = Lazy::new(|| std::io::stdout().is_terminal());

    struct View<T: Display> {
        inner: Option<T>,
        color: Color,
    }

    impl<T: Display> Display for View<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let text = self
                .inner
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string());

            if *STYLED {
                f.write_fmt(format_args!("{}", text.with(self.color)))
            } else {
                f.write_str(&text)
            }
        }
    }

    /// Construct structure declaration to display data of the same kind (file paths, errors, etc.).
    macro_rules! view_struct {
        ($name: ident, $color: expr) => {
            pub struct $name<T: Display>(View<T>);

            impl<T: Display> From<T> for $name<T> {
                fn from(value: T) -> Self {
                    Self(View {
                        inner: Some(value),
                        color: $color,
                    })
                }
            }

            impl<T: Display> From<Option<T>> for $name<T> {
                fn from(value: Option<T>) -> Self {
                    Self(View {
                        inner: value,
                        color: $color,
                    })
                }
            }

            impl<T: Display> Display for $name<T> {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        };
    }

    view_struct!(FilePathView, Color::Green);
    view_struct!(KeywordView, Color::Magenta);
    view_struct!(ErrorView, Color::Red);

}
