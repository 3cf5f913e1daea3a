//! 固定的运行时产物
//!
//! `__int_array` 是唯一的运行时类型, 外加一份把整个输出目录编成
//! 单一可执行文件的 CMakeLists。

use super::Artifact;

pub(super) fn int_array_header() -> Artifact {
    let contents = "\
#ifndef __INT_ARRAY_H
#define __INT_ARRAY_H

typedef struct __int_array {
\tint length;
\tint *data;
} __int_array;

__int_array *$_new___int_array(int size);

#endif //__INT_ARRAY_H
";
    Artifact { filename: "__int_array.h".to_string(), contents: contents.to_string() }
}

pub(super) fn int_array_source() -> Artifact {
    let contents = "\
#include \"__int_array.h\"
#include <stdio.h>
#include <stdlib.h>

__int_array *$_new___int_array(int size) {
\t__int_array *array = (__int_array *) malloc(sizeof(__int_array));
\tarray->length = size;
\tarray->data = calloc(size, sizeof(int));
\treturn array;
}
";
    Artifact { filename: "__int_array.c".to_string(), contents: contents.to_string() }
}

pub(super) fn cmake_lists() -> Artifact {
    let contents = "\
cmake_minimum_required(VERSION 3.23)
project(CompiledProject LANGUAGES C)

set(CMAKE_C_STANDARD 99)

file(GLOB_RECURSE SOURCES \"${CMAKE_CURRENT_SOURCE_DIR}/*.c\")
file(GLOB_RECURSE HEADERS \"${CMAKE_CURRENT_SOURCE_DIR}/*.h\")

foreach (SOURCE ${SOURCES})
    if (SOURCE MATCHES \"CMakeFiles/\")
        list(REMOVE_ITEM SOURCES ${SOURCE})
    endif ()
endforeach ()

add_executable(CompiledProject ${SOURCES} ${HEADERS})";
    Artifact { filename: "CMakeLists.txt".to_string(), contents: contents.to_string() }
}
