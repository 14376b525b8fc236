pub mod script_face_recognizer;
