//! Static per-language tables.
//!
//! Operator tables are ordered longest first; the lexer takes the first
//! table entry that matches at the cursor.

use super::{Builtin, CommentStyle, IdentifierChars, Language, StaticProfile, StringRules};
use crate::semantic::ValueType::{self, *};

const C_COMMENTS: &[CommentStyle] = &[
    CommentStyle::Line("//"),
    CommentStyle::Block {
        open: "/*",
        close: "*/",
    },
];

const SQL_COMMENTS: &[CommentStyle] = &[
    CommentStyle::Line("--"),
    CommentStyle::Block {
        open: "/*",
        close: "*/",
    },
];

const PLAIN_IDENTIFIERS: IdentifierChars = IdentifierChars {
    start: "",
    continuing: "",
};

const SQL_STRINGS: StringRules = StringRules {
    quotes: &['\'', '"'],
    multiline_quotes: &['\''],
    triple_quotes: false,
    backslash_escapes: false,
    doubled_quote_escape: true,
    char_quote: None,
    prefixes: &["N"],
};

const SQL_CONVERSIONS: &[(ValueType, ValueType)] = &[
    (Integer, Real),
    (Real, Integer),
    (Integer, String),
    (Real, String),
    (Char, String),
    (Boolean, Integer),
    (Integer, Boolean),
    (Null, Integer),
    (Null, Real),
    (Null, String),
    (Null, Boolean),
    (Null, Char),
];

// ==================== JavaScript ====================

pub(super) static JAVASCRIPT: StaticProfile = StaticProfile {
    language: Language::JavaScript,
    keywords: &[
        "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
        "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
        "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined",
        "var", "void", "while", "with", "yield",
    ],
    operators: &[
        "===", "!==", "**=", "...", ">>>", "<<=", ">>=", "&&=", "||=", "??=", "==", "!=", "<=",
        ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "**", "=>",
        "<<", ">>",
    ],
    single_operators: "+-*/%=<>!&|^~?:",
    delimiters: "(){}[];,.",
    comment_styles: C_COMMENTS,
    strings: StringRules {
        quotes: &['"', '\'', '`'],
        multiline_quotes: &['`'],
        triple_quotes: false,
        backslash_escapes: true,
        doubled_quote_escape: false,
        char_quote: None,
        prefixes: &[],
    },
    identifiers: IdentifierChars {
        start: "$",
        continuing: "$",
    },
    builtins: &[
        Builtin::object("console"),
        Builtin::object("window"),
        Builtin::object("document"),
        Builtin::object("Math"),
        Builtin::object("JSON"),
        Builtin::object("Object"),
        Builtin::object("Array"),
        Builtin::object("String"),
        Builtin::object("Number"),
        Builtin::object("Boolean"),
        Builtin::object("Date"),
        Builtin::object("Promise"),
        Builtin::object("Map"),
        Builtin::object("Set"),
        Builtin::object("Error"),
        Builtin::object("RegExp"),
        Builtin::object("Symbol"),
        Builtin::object("process"),
        Builtin::object("module"),
        Builtin::object("exports"),
        Builtin::object("localStorage"),
        Builtin::object("globalThis"),
        Builtin::constant("NaN", "number"),
        Builtin::constant("Infinity", "number"),
        Builtin::function("parseInt"),
        Builtin::function("parseFloat"),
        Builtin::function("isNaN"),
        Builtin::function("setTimeout"),
        Builtin::function("setInterval"),
        Builtin::function("clearTimeout"),
        Builtin::function("clearInterval"),
        Builtin::function("alert"),
        Builtin::function("prompt"),
        Builtin::function("require"),
        Builtin::function("fetch"),
    ],
    conversions: &[],
    statement_keywords: &[
        "var", "let", "const", "function", "class", "if", "for", "while", "do", "switch",
        "return", "try", "throw", "import", "export", "break", "continue",
    ],
    case_sensitive: true,
    coerces_freely: true,
};

// ==================== Python ====================

pub(super) static PYTHON: StaticProfile = StaticProfile {
    language: Language::Python,
    keywords: &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
        "return", "try", "while", "with", "yield",
    ],
    operators: &[
        "**=", "//=", ">>=", "<<=", "**", "//", "==", "!=", "<=", ">=", "->", ":=", "+=", "-=",
        "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>",
    ],
    single_operators: "+-*/%=<>&|^~@",
    delimiters: "(){}[];,.:",
    comment_styles: &[CommentStyle::Line("#")],
    strings: StringRules {
        quotes: &['"', '\''],
        multiline_quotes: &[],
        triple_quotes: true,
        backslash_escapes: true,
        doubled_quote_escape: false,
        char_quote: None,
        prefixes: &["f", "r", "b", "u", "rb", "br", "fr", "rf"],
    },
    identifiers: PLAIN_IDENTIFIERS,
    builtins: &[
        Builtin::function("print"),
        Builtin::function("input"),
        Builtin::function("len"),
        Builtin::function("range"),
        Builtin::function("str"),
        Builtin::function("int"),
        Builtin::function("float"),
        Builtin::function("bool"),
        Builtin::function("list"),
        Builtin::function("dict"),
        Builtin::function("set"),
        Builtin::function("tuple"),
        Builtin::function("type"),
        Builtin::function("isinstance"),
        Builtin::function("abs"),
        Builtin::function("max"),
        Builtin::function("min"),
        Builtin::function("sum"),
        Builtin::function("sorted"),
        Builtin::function("reversed"),
        Builtin::function("enumerate"),
        Builtin::function("zip"),
        Builtin::function("map"),
        Builtin::function("filter"),
        Builtin::function("open"),
        Builtin::function("round"),
        Builtin::function("any"),
        Builtin::function("all"),
        Builtin::function("super"),
        Builtin::function("chr"),
        Builtin::function("ord"),
        Builtin::function("format"),
        Builtin::function("repr"),
        Builtin::function("iter"),
        Builtin::function("next"),
        Builtin::object("object"),
        Builtin::object("Exception"),
        Builtin::object("ValueError"),
        Builtin::object("TypeError"),
        Builtin::object("KeyError"),
        Builtin::object("IndexError"),
        Builtin::constant("__name__", "str"),
    ],
    conversions: &[],
    statement_keywords: &[
        "def", "class", "if", "elif", "else", "for", "while", "try", "except", "finally",
        "with", "return", "import", "from", "pass", "raise", "break", "continue",
    ],
    case_sensitive: true,
    coerces_freely: true,
};

// ==================== C++ ====================

pub(super) static CPP: StaticProfile = StaticProfile {
    language: Language::Cpp,
    keywords: &[
        "alignas", "alignof", "auto", "bool", "break", "case", "catch", "char", "class",
        "const", "constexpr", "const_cast", "continue", "decltype", "default", "delete", "do",
        "double", "dynamic_cast", "else", "enum", "explicit", "extern", "false", "float", "for",
        "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
        "noexcept", "nullptr", "operator", "private", "protected", "public", "register",
        "reinterpret_cast", "return", "short", "signed", "sizeof", "static", "static_assert",
        "static_cast", "struct", "switch", "template", "this", "throw", "true", "try",
        "typedef", "typename", "union", "unsigned", "using", "virtual", "void", "volatile",
        "wchar_t", "while",
    ],
    operators: &[
        "<<=", ">>=", "->*", "::", "->", "++", "--", "==", "!=", "<=", ">=", "&&", "||", "+=",
        "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>",
    ],
    single_operators: "+-*/%=<>!&|^~?:",
    delimiters: "(){}[];,.",
    comment_styles: C_COMMENTS,
    strings: StringRules {
        quotes: &['"'],
        multiline_quotes: &[],
        triple_quotes: false,
        backslash_escapes: true,
        doubled_quote_escape: false,
        char_quote: Some('\''),
        prefixes: &["L", "u8"],
    },
    identifiers: PLAIN_IDENTIFIERS,
    builtins: &[
        Builtin::object("std"),
        Builtin::object("cout"),
        Builtin::object("cin"),
        Builtin::object("cerr"),
        Builtin::object("endl"),
        Builtin::object("string"),
        Builtin::object("vector"),
        Builtin::object("map"),
        Builtin::object("set"),
        Builtin::object("pair"),
        Builtin::object("size_t"),
        Builtin::constant("NULL", "pointer"),
        Builtin::function("printf"),
        Builtin::function("scanf"),
        Builtin::function("puts"),
        Builtin::function("malloc"),
        Builtin::function("free"),
        Builtin::function("strlen"),
        Builtin::function("strcpy"),
        Builtin::function("exit"),
        Builtin::function("rand"),
        Builtin::function("srand"),
        Builtin::function("sqrt"),
        Builtin::function("pow"),
        Builtin::function("abs"),
        Builtin::function("getline"),
        Builtin::function("to_string"),
        Builtin::function("sort"),
        Builtin::function("swap"),
        Builtin::function("max"),
        Builtin::function("min"),
    ],
    conversions: &[
        (Integer, Real),
        (Real, Integer),
        (Char, Integer),
        (Integer, Char),
        (Boolean, Integer),
        (Integer, Boolean),
        (Real, Boolean),
        (Char, String),
        (Null, Pointer),
        (Integer, Pointer),
    ],
    statement_keywords: &[
        "int", "float", "double", "char", "bool", "void", "auto", "class", "struct", "if",
        "for", "while", "do", "switch", "return", "using", "namespace", "template", "typedef",
    ],
    case_sensitive: true,
    coerces_freely: false,
};

// ==================== HTML ====================

pub(super) static HTML: StaticProfile = StaticProfile {
    language: Language::Html,
    keywords: &[
        "html", "head", "body", "title", "meta", "link", "script", "style", "div", "span", "p",
        "a", "img", "ul", "ol", "li", "table", "tr", "td", "th", "thead", "tbody", "tfoot",
        "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "form", "input", "button", "label",
        "select", "option", "textarea", "nav", "header", "footer", "section", "article",
        "aside", "main", "strong", "em", "b", "i", "u", "code", "pre", "blockquote", "iframe",
        "video", "audio", "source", "canvas", "svg", "small", "sub", "sup", "center", "font",
        "marquee", "doctype",
    ],
    operators: &["</", "/>"],
    single_operators: "=<>/!?",
    delimiters: "(){}[];,.:",
    comment_styles: &[CommentStyle::Block {
        open: "<!--",
        close: "-->",
    }],
    strings: StringRules {
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        triple_quotes: false,
        backslash_escapes: false,
        doubled_quote_escape: false,
        char_quote: None,
        prefixes: &[],
    },
    identifiers: IdentifierChars {
        start: "",
        continuing: "-",
    },
    builtins: &[],
    conversions: &[],
    statement_keywords: &[],
    case_sensitive: false,
    coerces_freely: true,
};

// ==================== Pascal ====================

pub(super) static PASCAL: StaticProfile = StaticProfile {
    language: Language::Pascal,
    keywords: &[
        "and", "array", "begin", "case", "class", "const", "constructor", "destructor", "div",
        "do", "downto", "else", "end", "except", "exit", "false", "file", "finally", "for",
        "forward", "function", "goto", "if", "implementation", "in", "inherited", "interface",
        "label", "mod", "nil", "not", "object", "of", "or", "packed", "procedure", "program",
        "raise", "record", "repeat", "set", "shl", "shr", "then", "to", "true", "try", "type",
        "unit", "until", "uses", "var", "while", "with", "xor",
    ],
    operators: &[":=", "<>", "<=", ">=", "..", "+=", "-=", "*=", "/="],
    single_operators: "+-*/=<>@^",
    delimiters: "()[];,.:",
    comment_styles: &[
        CommentStyle::Block {
            open: "(*",
            close: "*)",
        },
        CommentStyle::Block {
            open: "{",
            close: "}",
        },
        CommentStyle::Line("//"),
    ],
    strings: StringRules {
        quotes: &['\''],
        multiline_quotes: &[],
        triple_quotes: false,
        backslash_escapes: false,
        doubled_quote_escape: true,
        char_quote: None,
        prefixes: &[],
    },
    identifiers: PLAIN_IDENTIFIERS,
    builtins: &[
        Builtin::function("writeln"),
        Builtin::function("write"),
        Builtin::function("readln"),
        Builtin::function("read"),
        Builtin::function("length"),
        Builtin::function("inc"),
        Builtin::function("dec"),
        Builtin::function("ord"),
        Builtin::function("chr"),
        Builtin::function("abs"),
        Builtin::function("sqr"),
        Builtin::function("sqrt"),
        Builtin::function("round"),
        Builtin::function("trunc"),
        Builtin::function("random"),
        Builtin::function("randomize"),
        Builtin::function("halt"),
        Builtin::function("copy"),
        Builtin::function("pos"),
        Builtin::function("concat"),
        Builtin::function("upcase"),
        Builtin::function("succ"),
        Builtin::function("pred"),
        Builtin::function("odd"),
        Builtin::constant("maxint", "integer"),
        Builtin::constant("pi", "real"),
        // Predeclared types, which programs may redeclare.
        Builtin::type_name("integer"),
        Builtin::type_name("real"),
        Builtin::type_name("boolean"),
        Builtin::type_name("char"),
        Builtin::type_name("string"),
        Builtin::type_name("byte"),
        Builtin::type_name("word"),
        Builtin::type_name("longint"),
        Builtin::type_name("shortint"),
        Builtin::type_name("double"),
        Builtin::type_name("single"),
        Builtin::type_name("extended"),
        Builtin::type_name("text"),
    ],
    conversions: &[(Integer, Real), (Char, String)],
    statement_keywords: &[
        "program", "uses", "var", "const", "type", "procedure", "function", "begin", "end",
        "if", "while", "for", "repeat", "case", "with",
    ],
    case_sensitive: false,
    coerces_freely: false,
};

// ==================== SQL dialects ====================

pub(super) static TSQL: StaticProfile = StaticProfile {
    language: Language::TSql,
    keywords: &[
        "add", "all", "alter", "and", "any", "as", "asc", "begin", "between", "by", "case",
        "catch", "check", "close", "column", "commit", "constraint", "create", "cross",
        "cursor", "database", "deallocate", "declare", "default", "delete", "desc", "distinct",
        "drop", "else", "end", "exec", "execute", "exists", "fetch", "foreign", "from", "full",
        "function", "go", "grant", "group", "having", "identity", "if", "in", "index", "inner",
        "insert", "into", "is", "join", "key", "left", "like", "merge", "not", "null", "on",
        "open", "or", "order", "outer", "output", "primary", "print", "proc", "procedure",
        "raiserror", "references", "return", "returns", "right", "rollback", "select", "set",
        "table", "then", "throw", "top", "tran", "transaction", "trigger", "truncate", "try",
        "union", "unique", "update", "use", "values", "view", "when", "where", "while", "with",
        "int", "bigint", "smallint", "tinyint", "bit", "decimal", "numeric", "money", "float",
        "real", "date", "datetime", "datetime2", "time", "char", "varchar", "nchar",
        "nvarchar", "text", "ntext", "uniqueidentifier", "varbinary",
    ],
    operators: &["<>", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "||", "::"],
    single_operators: "+-*/%=<>!&|^~",
    delimiters: "()[];,.:",
    comment_styles: SQL_COMMENTS,
    strings: SQL_STRINGS,
    identifiers: IdentifierChars {
        start: "@#",
        continuing: "@#$",
    },
    builtins: &[
        Builtin::function("getdate"),
        Builtin::function("count"),
        Builtin::function("sum"),
        Builtin::function("avg"),
        Builtin::function("min"),
        Builtin::function("max"),
        Builtin::function("len"),
        Builtin::function("upper"),
        Builtin::function("lower"),
        Builtin::function("substring"),
        Builtin::function("cast"),
        Builtin::function("convert"),
        Builtin::function("isnull"),
        Builtin::function("coalesce"),
        Builtin::function("newid"),
        Builtin::function("datediff"),
        Builtin::function("dateadd"),
        Builtin::function("ltrim"),
        Builtin::function("rtrim"),
        Builtin::function("replace"),
        Builtin::function("round"),
        Builtin::function("abs"),
        Builtin::function("scope_identity"),
        Builtin::constant("@@rowcount", "int"),
        Builtin::constant("@@identity", "int"),
        Builtin::constant("@@error", "int"),
    ],
    conversions: SQL_CONVERSIONS,
    statement_keywords: &[
        "select", "insert", "update", "delete", "create", "alter", "drop", "declare", "begin",
        "end", "set", "if", "while", "exec", "execute", "print", "go", "use", "truncate",
        "merge", "grant", "return",
    ],
    case_sensitive: false,
    coerces_freely: false,
};

pub(super) static PLSQL: StaticProfile = StaticProfile {
    language: Language::PlSql,
    keywords: &[
        "alter", "and", "as", "begin", "between", "binary_integer", "blob", "body", "boolean",
        "by", "case", "char", "clob", "close", "commit", "constant", "create", "cursor", "date",
        "declare", "default", "delete", "distinct", "drop", "else", "elsif", "end",
        "exception", "execute", "exit", "false", "fetch", "for", "from", "function", "grant",
        "group", "having", "if", "immediate", "in", "index", "insert", "integer", "into", "is",
        "like", "loop", "not", "null", "number", "of", "open", "or", "order", "others", "out",
        "package", "pls_integer", "pragma", "procedure", "raise", "record", "replace",
        "return", "returning", "rollback", "rowtype", "select", "set", "table", "then",
        "timestamp", "trigger", "true", "type", "update", "values", "varchar", "varchar2",
        "view", "when", "where", "while",
    ],
    operators: &["<>", "!=", "<=", ">=", "||", ":=", "=>", "..", "**"],
    single_operators: "+-*/%=<>!&|^~",
    delimiters: "()[];,.:",
    comment_styles: SQL_COMMENTS,
    strings: SQL_STRINGS,
    identifiers: IdentifierChars {
        start: "",
        continuing: "$#",
    },
    builtins: &[
        Builtin::object("dbms_output"),
        Builtin::function("put_line"),
        Builtin::function("count"),
        Builtin::function("sum"),
        Builtin::function("avg"),
        Builtin::function("min"),
        Builtin::function("max"),
        Builtin::function("nvl"),
        Builtin::function("to_char"),
        Builtin::function("to_date"),
        Builtin::function("to_number"),
        Builtin::function("upper"),
        Builtin::function("lower"),
        Builtin::function("substr"),
        Builtin::function("length"),
        Builtin::function("trunc"),
        Builtin::function("round"),
        Builtin::function("raise_application_error"),
        Builtin::constant("sysdate", "date"),
        Builtin::constant("sqlerrm", "varchar2"),
        Builtin::constant("sqlcode", "number"),
        Builtin::constant("rownum", "number"),
        Builtin::object("dual"),
        Builtin::constant("no_data_found", "exception"),
        Builtin::constant("too_many_rows", "exception"),
    ],
    conversions: SQL_CONVERSIONS,
    statement_keywords: &[
        "select", "insert", "update", "delete", "create", "alter", "drop", "declare", "begin",
        "end", "if", "loop", "for", "while", "exception", "commit", "rollback", "execute",
        "grant",
    ],
    case_sensitive: false,
    coerces_freely: false,
};

// ==================== Unknown ====================

pub(super) static UNKNOWN: StaticProfile = StaticProfile {
    language: Language::Unknown,
    keywords: &[
        "if", "else", "for", "while", "return", "function", "def", "class", "var", "let",
        "const", "int", "float", "string", "print", "import", "true", "false", "null",
    ],
    operators: &["==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "=>", "->"],
    single_operators: "+-*/%=<>!&|^~?:",
    delimiters: "(){}[];,.",
    comment_styles: &[
        CommentStyle::Line("//"),
        CommentStyle::Line("#"),
        CommentStyle::Block {
            open: "/*",
            close: "*/",
        },
    ],
    strings: StringRules {
        quotes: &['"', '\''],
        multiline_quotes: &[],
        triple_quotes: false,
        backslash_escapes: true,
        doubled_quote_escape: false,
        char_quote: None,
        prefixes: &[],
    },
    identifiers: PLAIN_IDENTIFIERS,
    builtins: &[],
    conversions: &[],
    statement_keywords: &[
        "if", "for", "while", "return", "function", "def", "class", "var", "let", "const",
    ],
    case_sensitive: true,
    coerces_freely: true,
};
