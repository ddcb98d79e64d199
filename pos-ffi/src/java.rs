//! Binding JNI para a classe Java `pos.tagger.POSTagger` (feature `java`).
//!
//! O lado Java guarda o handle como `long` e recebe as tags como um array JSON
//! `[{"word": ..., "tag": ..., "conf": ...}]`. Falhas viram exceções Java em vez de
//! derrubar a JVM: `create` devolve `0` e lança `IllegalStateException` com a mensagem
//! do [`LoadError`](pos_core::LoadError).

use std::ptr;

use jni::objects::{JObject, JString};
use jni::sys::{jlong, jstring};
use jni::JNIEnv;
use pos_core::{TaggedWord, TaggerHandle};
use serde::Serialize;
use tracing::error;

use super::{set_last_error, TAGGER_ERR_INVALID_ARGUMENT, TAGGER_OK};

const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";
const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";

/// Formato lido por `POSTagger.tag` no lado Java.
#[derive(Serialize)]
struct JavaTag<'a> {
    word: &'a str,
    tag: &'a str,
    conf: f32,
}

pub(crate) fn tags_json(tagged: &[TaggedWord]) -> serde_json::Result<String> {
    let tags: Vec<JavaTag<'_>> = tagged
        .iter()
        .map(|tw| JavaTag {
            word: &tw.word,
            tag: &tw.tag,
            conf: tw.confidence as f32,
        })
        .collect();
    serde_json::to_string(&tags)
}

/// Lança `class` só se não houver outra exceção pendente.
fn throw(env: &mut JNIEnv<'_>, class: &str, msg: &str) {
    if !env.exception_check().unwrap_or(true) {
        let _ = env.throw_new(class, msg);
    }
}

fn read_string(env: &mut JNIEnv<'_>, s: &JString<'_>, what: &str) -> Option<String> {
    match env.get_string(s) {
        Ok(java_str) => Some(java_str.into()),
        Err(e) => {
            error!("{what}: {e}");
            throw(env, ILLEGAL_ARGUMENT, &format!("{what}: {e}"));
            None
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_pos_tagger_POSTagger_create<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    weights_filepath: JString<'local>,
    classes_filepath: JString<'local>,
    tags_filepath: JString<'local>,
) -> jlong {
    let Some(weights) = read_string(&mut env, &weights_filepath, "weightsPath") else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return 0;
    };
    let Some(classes) = read_string(&mut env, &classes_filepath, "classesPath") else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return 0;
    };
    let Some(tags) = read_string(&mut env, &tags_filepath, "tagsPath") else {
        set_last_error(TAGGER_ERR_INVALID_ARGUMENT);
        return 0;
    };

    match TaggerHandle::create(&weights, &tags, &classes) {
        Ok(handle) => {
            set_last_error(TAGGER_OK);
            Box::into_raw(Box::new(handle)) as jlong
        }
        Err(e) => {
            error!(kind = ?e.kind(), "POSTagger.create: {e}");
            set_last_error(e.kind().code());
            throw(&mut env, ILLEGAL_STATE, &e.to_string());
            0
        }
    }
}

/// # Safety
/// `instance` deve ser `0` ou um valor devolvido por `create` ainda não liberado.
#[no_mangle]
pub unsafe extern "system" fn Java_pos_tagger_POSTagger_annotate<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    instance: jlong,
    sentence: JString<'local>,
) -> jstring {
    let Some(handle) = (instance as *mut TaggerHandle).as_mut() else {
        throw(&mut env, ILLEGAL_STATE, "tagger não criado ou já liberado");
        return ptr::null_mut();
    };
    let Some(sentence) = read_string(&mut env, &sentence, "sentence") else {
        return ptr::null_mut();
    };

    let json = match tags_json(handle.annotate(&sentence)) {
        Ok(json) => json,
        Err(e) => {
            throw(&mut env, ILLEGAL_STATE, &e.to_string());
            return ptr::null_mut();
        }
    };
    match env.new_string(json) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("POSTagger.annotate: {e}");
            throw(&mut env, ILLEGAL_STATE, &e.to_string());
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `instance` deve ser `0` ou um valor devolvido por `create`, e não pode ser usado depois.
#[no_mangle]
pub unsafe extern "system" fn Java_pos_tagger_POSTagger_release<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    instance: jlong,
) {
    if instance != 0 {
        Box::from_raw(instance as *mut TaggerHandle).release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos_core::TagSource;

    #[test]
    fn test_tags_json_uses_java_field_names() {
        let tagged = vec![
            TaggedWord {
                word: "the".to_string(),
                tag: "DET".to_string(),
                confidence: 1.0,
                source: TagSource::Dictionary,
            },
            TaggedWord {
                word: "dog".to_string(),
                tag: "NOUN".to_string(),
                confidence: 0.75,
                source: TagSource::Model,
            },
        ];
        let json = tags_json(&tagged).unwrap();
        assert_eq!(
            json,
            r#"[{"word":"the","tag":"DET","conf":1.0},{"word":"dog","tag":"NOUN","conf":0.75}]"#
        );
    }

    #[test]
    fn test_tags_json_empty_sentence() {
        assert_eq!(tags_json(&[]).unwrap(), "[]");
    }
}
